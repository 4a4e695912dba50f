//! # Ping/Pong Demo
//!
//! Exercises the broker end to end inside one process: a dispatcher answers
//! `"pong"` on the demo route, and a requester sends `"ping"` to the same
//! route on a fixed interval and logs whatever comes back.

use std::time::Duration;

use courier_bus::{Broker, BrokerError, Responder};
use courier_types::{Request, Response, RouteId, Ttl, WaitTimeout};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::DemoSection;

/// Payload the requester sends.
pub const PING: &str = "ping";

/// Payload the handler answers with.
pub const PONG: &str = "pong";

/// Demo service bound to one broker and route.
#[derive(Clone)]
pub struct PingPongService {
    broker: Broker,
    route: RouteId,
    interval: Duration,
    wait_timeout: WaitTimeout,
    response_ttl: Ttl,
}

impl PingPongService {
    pub fn new(broker: Broker, settings: &DemoSection) -> Self {
        Self {
            broker,
            route: settings.route(),
            interval: settings.interval(),
            wait_timeout: settings.wait_timeout(),
            response_ttl: settings.response_ttl(),
        }
    }

    /// Serve the demo route until the broker's transport fails or closes.
    pub async fn serve(&self) -> Result<(), BrokerError> {
        let response_ttl = self.response_ttl;
        let route = self.route;

        self.broker
            .receive(route, move |payload: Value, responder: Responder| async move {
                info!(%route, correlation_id = %responder.correlation_id(), %payload, "received data");

                let response = Response::new(PONG).with_ttl(response_ttl);
                if let Err(e) = responder.respond(response).await {
                    warn!(%route, error = %e, "respond failed");
                }
            })
            .await
    }

    /// Send one ping and wait for its answer.
    pub async fn ping_once(&self) -> Result<Value, BrokerError> {
        let request = Request::new(self.broker.address(self.route), PING);
        self.broker.call(request, self.wait_timeout).await
    }

    /// Ping every interval until `shutdown` flips to `true`.
    ///
    /// Failures are logged and the loop carries on.
    pub async fn run_requester(&self, mut shutdown: watch::Receiver<bool>) {
        info!(route = %self.route, interval = ?self.interval, "demo requester started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                result = self.ping_once() => match result {
                    Ok(response) => info!(%response, "demo response"),
                    Err(e) if e.is_timeout() => warn!(error = %e, "demo wait timed out"),
                    Err(e) => error!(error = %e, "demo request failed"),
                },
                _ = shutdown.changed() => break,
            }
        }

        info!(route = %self.route, "demo requester stopped");
    }
}
