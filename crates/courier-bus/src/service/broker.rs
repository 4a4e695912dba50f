//! # Broker Service
//!
//! Request/response messaging over a shared queue store.
//!
//! ## Flow
//!
//! ```text
//!  caller                       store                         service
//!  ──────                       ─────                         ───────
//!  send(req) ──RPUSH+EXPIRE──▶ "{service}:{route}" ──BLPOP──▶ dispatcher
//!                                                                │
//!                                                          handler(payload)
//!                                                                │
//!  wait(id)  ◀──────BLPOP───── "{correlation id}" ◀─RPUSH+EXPIRE─ responder
//! ```
//!
//! Every request queue is shared by all consumers of an address; every
//! response queue belongs to exactly one request.

use std::sync::Arc;

use courier_types::{
    decode_payload, Address, CorrelationId, Request, RequestEnvelope, RouteId, WaitTimeout,
    MAX_TTL_SECS, MAX_WAIT_SECS,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::metrics::{BrokerMetrics, MetricsRecorder};
use crate::ports::{QueueTransport, RequestHandler};
use crate::service::dispatcher::{DecodeFailure, Dispatcher};
use crate::service::responder::Responder;

/// Decode failure reports buffered per subscriber before the oldest is dropped.
pub const DECODE_FAILURE_CHANNEL_CAPACITY: usize = 256;

/// Broker handle.
///
/// Cheap to clone; clones share the transport client, the metrics recorder
/// and the decode failure channel.
#[derive(Clone)]
pub struct Broker {
    transport: Arc<dyn QueueTransport>,
    config: BrokerConfig,
    metrics: Arc<dyn MetricsRecorder>,
    failures: broadcast::Sender<DecodeFailure>,
}

impl Broker {
    /// Validate `config` and probe `transport` before handing out a broker.
    ///
    /// The transport is owned by the broker from here on; [`Broker::close`]
    /// ends its lifecycle.
    pub async fn connect(
        transport: Arc<dyn QueueTransport>,
        config: BrokerConfig,
    ) -> Result<Self, BrokerError> {
        config.validate()?;
        transport.ping().await?;

        let (failures, _) = broadcast::channel(DECODE_FAILURE_CHANNEL_CAPACITY);

        info!(
            service = %config.service,
            request_ttl_secs = config.request_ttl_secs.get(),
            response_ttl_secs = config.response_ttl_secs.get(),
            dispatch = ?config.dispatch,
            "broker connected"
        );

        Ok(Self {
            transport,
            config,
            metrics: Arc::new(BrokerMetrics::new()),
            failures,
        })
    }

    /// Replace the metrics recorder.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Address of `route` on this broker's own service.
    #[must_use]
    pub fn address(&self, route: RouteId) -> Address {
        Address::from_ids(self.config.service, route)
    }

    /// Enqueue a request and return the id its response will be keyed by.
    ///
    /// Fire-and-forget: nothing is waited for. The address queue's expiry is
    /// reset on every send.
    pub async fn send<T: Serialize>(&self, request: Request<T>) -> Result<CorrelationId, BrokerError> {
        let ttl_secs = request
            .ttl
            .checked_resolve(self.config.request_ttl_secs)
            .ok_or(BrokerError::TtlOutOfRange {
                ttl_secs: request.ttl.resolve(self.config.request_ttl_secs),
                max_secs: MAX_TTL_SECS,
            })?;
        let id = CorrelationId::generate();
        let bytes = RequestEnvelope::new(id, &request.payload).encode()?;

        self.transport
            .push_with_expiry(&request.address.key(), bytes, ttl_secs)
            .await?;

        self.metrics.record_request_sent(&request.address);
        debug!(address = %request.address, correlation_id = %id, ttl_secs, "request sent");
        Ok(id)
    }

    /// Serve `route` on this broker's service with `handler`.
    ///
    /// Runs until the transport fails, which includes [`Broker::close`].
    /// Malformed requests are skipped and reported on
    /// [`Broker::decode_failures`]. Handlers still running when this returns
    /// keep running.
    ///
    /// Closure handlers need their argument types spelled out:
    ///
    /// ```ignore
    /// broker
    ///     .receive(RouteId(1), |payload: Value, responder: Responder| async move {
    ///         let _ = responder.respond_with(&payload).await;
    ///     })
    ///     .await?;
    /// ```
    pub async fn receive<H: RequestHandler>(&self, route: RouteId, handler: H) -> Result<(), BrokerError> {
        Dispatcher {
            address: self.address(route),
            transport: self.transport.clone(),
            metrics: self.metrics.clone(),
            failures: self.failures.clone(),
            response_ttl: self.config.response_ttl_secs,
            policy: self.config.dispatch,
            handler: Arc::new(handler),
        }
        .run()
        .await
    }

    /// Reply handle for a request, given its correlation id.
    #[must_use]
    pub fn responder(&self, id: CorrelationId) -> Responder {
        Responder::new(
            id,
            self.transport.clone(),
            self.metrics.clone(),
            self.config.response_ttl_secs,
        )
    }

    /// Block until one response to `id` arrives, or `timeout` lapses.
    ///
    /// Consumes exactly one response item. Timeouts are whole seconds on the
    /// wire; fractions round up.
    pub async fn wait(&self, id: CorrelationId, timeout: WaitTimeout) -> Result<Value, BrokerError> {
        self.wait_as(id, timeout).await
    }

    /// [`Broker::wait`], decoding the payload as `T`.
    pub async fn wait_as<T: DeserializeOwned>(
        &self,
        id: CorrelationId,
        timeout: WaitTimeout,
    ) -> Result<T, BrokerError> {
        let block_secs = timeout
            .checked_block_secs()
            .ok_or(BrokerError::TimeoutOutOfRange {
                timeout,
                max_secs: MAX_WAIT_SECS,
            })?;

        let started = Instant::now();
        let popped = self.transport.blocking_pop(&id.as_key(), block_secs).await?;

        match popped {
            Some(raw) => {
                self.metrics.record_response_collected(started.elapsed());
                debug!(correlation_id = %id, "response collected");
                Ok(decode_payload(&raw)?)
            }
            None => {
                self.metrics.record_wait_timeout();
                debug!(correlation_id = %id, ?timeout, "wait timed out");
                Err(BrokerError::Timeout {
                    correlation_id: id,
                    timeout,
                })
            }
        }
    }

    /// Send a request and wait for its first response.
    pub async fn call<T: Serialize>(
        &self,
        request: Request<T>,
        timeout: WaitTimeout,
    ) -> Result<Value, BrokerError> {
        self.call_as(request, timeout).await
    }

    /// [`Broker::call`], decoding the response as `R`.
    pub async fn call_as<T: Serialize, R: DeserializeOwned>(
        &self,
        request: Request<T>,
        timeout: WaitTimeout,
    ) -> Result<R, BrokerError> {
        let id = self.send(request).await?;
        self.wait_as(id, timeout).await
    }

    /// Subscribe to reports of skipped malformed requests.
    ///
    /// Only failures after this call are delivered.
    #[must_use]
    pub fn decode_failures(&self) -> broadcast::Receiver<DecodeFailure> {
        self.failures.subscribe()
    }

    /// Close the transport client. Running dispatchers and waiters fail with
    /// a closed transport error.
    pub async fn close(&self) {
        self.transport.close().await;
        info!(service = %self.config.service, "broker closed");
    }
}
