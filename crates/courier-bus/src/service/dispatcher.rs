//! # Dispatcher
//!
//! The receive loop for one address. It pops one request at a time, decodes
//! the envelope and hands it to the registered handler on a task of its own.
//!
//! ```text
//!   address queue ──BLPOP──▶ decode ──▶ spawn(handler(payload, responder))
//!                     ▲         │
//!                     │         └── malformed: warn, count, report, skip
//!                     └── permit (bounded mode) taken before each pop
//! ```
//!
//! In bounded mode a saturated dispatcher stops draining its queue, leaving
//! work for competing consumers of the same address.

use std::any::Any;
use std::num::NonZeroU64;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use courier_types::{Address, CodecError, RequestEnvelope};
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::{broadcast, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::DispatchPolicy;
use crate::error::BrokerError;
use crate::metrics::MetricsRecorder;
use crate::ports::{QueueTransport, RequestHandler};
use crate::service::responder::Responder;

/// A request item that could not be decoded and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    /// Address the item was popped from.
    pub address: Address,
    /// The raw item, unchanged.
    pub raw: Vec<u8>,
    /// Decoder error message.
    pub error: String,
}

pub(crate) struct Dispatcher<H> {
    pub address: Address,
    pub transport: Arc<dyn QueueTransport>,
    pub metrics: Arc<dyn MetricsRecorder>,
    pub failures: broadcast::Sender<DecodeFailure>,
    pub response_ttl: NonZeroU64,
    pub policy: DispatchPolicy,
    pub handler: Arc<H>,
}

/// Running handler tasks. Dropping the set detaches them instead of
/// aborting, so handlers finish even after the loop is gone.
struct HandlerTasks(JoinSet<()>);

impl HandlerTasks {
    fn reap(&mut self) {
        while let Some(Some(_)) = self.0.join_next().now_or_never() {}
    }
}

impl Drop for HandlerTasks {
    fn drop(&mut self) {
        self.0.detach_all();
    }
}

/// Records the end of a handler, including by panic.
struct InFlight(Arc<dyn MetricsRecorder>);

impl InFlight {
    fn start(metrics: Arc<dyn MetricsRecorder>) -> Self {
        metrics.record_handler_started();
        Self(metrics)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.record_handler_finished();
    }
}

impl<H: RequestHandler> Dispatcher<H> {
    /// Run until the transport fails.
    pub async fn run(self) -> Result<(), BrokerError> {
        let key = self.address.key();
        let limiter = match self.policy {
            DispatchPolicy::Bounded { max_in_flight } => Some(Arc::new(Semaphore::new(max_in_flight))),
            DispatchPolicy::Unbounded => None,
        };
        let mut tasks = HandlerTasks(JoinSet::new());

        info!(address = %self.address, policy = ?self.policy, "dispatcher started");

        loop {
            tasks.reap();

            let permit = match &limiter {
                Some(limiter) => Some(acquire(limiter).await?),
                None => None,
            };

            let raw = match self.transport.blocking_pop(&key, 0).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    error!(address = %self.address, error = %err, "dispatcher stopped");
                    return Err(err.into());
                }
            };

            let envelope = match RequestEnvelope::<Value>::decode(&raw) {
                Ok(envelope) => envelope,
                Err(err) => {
                    self.report_decode_failure(raw, &err);
                    continue;
                }
            };

            self.metrics.record_request_received(&self.address);
            debug!(address = %self.address, correlation_id = %envelope.id, "request received");

            self.spawn_handler(&mut tasks, envelope, permit);
        }
    }

    fn spawn_handler(
        &self,
        tasks: &mut HandlerTasks,
        envelope: RequestEnvelope,
        permit: Option<OwnedSemaphorePermit>,
    ) {
        let responder = Responder::new(
            envelope.id,
            self.transport.clone(),
            self.metrics.clone(),
            self.response_ttl,
        );
        let handler = self.handler.clone();
        let metrics = self.metrics.clone();
        let address = self.address;
        let correlation_id = envelope.id;

        tasks.0.spawn(async move {
            let _permit = permit;
            let _in_flight = InFlight::start(metrics.clone());

            let outcome = AssertUnwindSafe(handler.handle(envelope.data, responder))
                .catch_unwind()
                .await;

            if let Err(panic) = outcome {
                error!(
                    %address,
                    %correlation_id,
                    panic = panic_message(&*panic),
                    "request handler panicked"
                );
                metrics.record_handler_panic(&address);
            }
        });
    }

    fn report_decode_failure(&self, raw: Vec<u8>, err: &CodecError) {
        warn!(
            address = %self.address,
            error = %err,
            len = raw.len(),
            "skipping malformed request"
        );
        self.metrics.record_decode_failure(&self.address);

        // No subscribers is fine.
        let _ = self.failures.send(DecodeFailure {
            address: self.address,
            raw,
            error: err.to_string(),
        });
    }
}

async fn acquire(limiter: &Arc<Semaphore>) -> Result<OwnedSemaphorePermit, BrokerError> {
    limiter
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| BrokerError::InvalidConfig("dispatch limiter closed".to_string()))
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
