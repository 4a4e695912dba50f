//! Error types for the broker.

use courier_types::{CodecError, CorrelationId, WaitTimeout};
use thiserror::Error;

/// Failures reported by a transport adapter.
///
/// The message text of the underlying client error is preserved verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport connection error: {0}")]
    Connection(String),

    #[error("Transport protocol error: {0}")]
    Protocol(String),

    #[error("Transport pool error: {0}")]
    Pool(String),

    #[error("Transport closed")]
    Closed,
}

/// Errors surfaced by broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The shared store failed; nothing was retried.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A payload or envelope could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// No response arrived before the waiter's deadline.
    ///
    /// Covers a handler that never ran as well as a response consumed by
    /// another waiter.
    #[error("Timed out after {timeout:?} waiting for response {correlation_id}")]
    Timeout {
        correlation_id: CorrelationId,
        timeout: WaitTimeout,
    },

    /// A queue lifetime above `MAX_TTL_SECS`. Nothing was pushed.
    #[error("TTL of {ttl_secs}s exceeds the maximum of {max_secs}s")]
    TtlOutOfRange { ttl_secs: u64, max_secs: u64 },

    /// A finite wait above `MAX_WAIT_SECS`. Nothing was popped.
    #[error("Wait timeout {timeout:?} exceeds the maximum of {max_secs}s")]
    TimeoutOutOfRange { timeout: WaitTimeout, max_secs: u64 },

    #[error("Invalid broker configuration: {0}")]
    InvalidConfig(String),
}

impl BrokerError {
    /// True if this is a wait deadline, not a failure of the transport.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True if the transport client has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Closed))
    }
}
