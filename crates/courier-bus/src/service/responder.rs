//! # Responder
//!
//! The reply handle given to a handler for one request. It knows the
//! request's correlation id, so answering never needs to know who asked.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use courier_types::{encode_payload, CorrelationId, Response, MAX_TTL_SECS};
use serde::Serialize;
use tracing::debug;

use crate::error::BrokerError;
use crate::metrics::MetricsRecorder;
use crate::ports::QueueTransport;

/// Pushes responses onto one correlation queue.
///
/// Cloneable and reusable: every call appends another item, and a waiter
/// collects them one at a time in order. Never calling it is also legal.
#[derive(Clone)]
pub struct Responder {
    id: CorrelationId,
    transport: Arc<dyn QueueTransport>,
    metrics: Arc<dyn MetricsRecorder>,
    default_ttl: NonZeroU64,
}

impl Responder {
    pub(crate) fn new(
        id: CorrelationId,
        transport: Arc<dyn QueueTransport>,
        metrics: Arc<dyn MetricsRecorder>,
        default_ttl: NonZeroU64,
    ) -> Self {
        Self {
            id,
            transport,
            metrics,
            default_ttl,
        }
    }

    /// Correlation id this responder answers.
    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        self.id
    }

    /// Push `response` onto the correlation queue and refresh its expiry.
    ///
    /// Succeeds even if nobody is waiting; the item expires with the queue.
    pub async fn respond<T: Serialize>(&self, response: Response<T>) -> Result<(), BrokerError> {
        let ttl_secs = response
            .ttl
            .checked_resolve(self.default_ttl)
            .ok_or(BrokerError::TtlOutOfRange {
                ttl_secs: response.ttl.resolve(self.default_ttl),
                max_secs: MAX_TTL_SECS,
            })?;
        let bytes = encode_payload(&response.payload)?;

        self.transport
            .push_with_expiry(&self.id.as_key(), bytes, ttl_secs)
            .await?;

        self.metrics.record_response_sent();
        debug!(correlation_id = %self.id, ttl_secs, "response sent");
        Ok(())
    }

    /// Respond with the default correlation queue lifetime.
    pub async fn respond_with<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), BrokerError> {
        self.respond(Response::new(payload)).await
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("id", &self.id)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
