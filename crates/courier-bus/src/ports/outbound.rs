//! Outbound Ports (Driven Ports)
//!
//! The broker's only dependency: a shared store offering named FIFO lists
//! with whole-key expiry and blocking pop.

use async_trait::async_trait;

use crate::error::TransportError;

/// Shared key-value/queue store (Driven Port)
///
/// Keys are plain strings. Every implementation must guarantee that an item
/// pushed once is popped at most once, even with many concurrent poppers on
/// the same key.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Append `value` to the tail of `key` and reset the key's expiry to
    /// `ttl_secs`, as one atomic step.
    ///
    /// Either both effects are applied or neither is.
    async fn push_with_expiry(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_secs: u64,
    ) -> Result<(), TransportError>;

    /// Remove and return the head of `key`.
    ///
    /// Suspends until an item exists or `timeout_secs` lapses; `0` waits
    /// forever. `Ok(None)` means the timeout lapsed.
    async fn blocking_pop(
        &self,
        key: &str,
        timeout_secs: u64,
    ) -> Result<Option<Vec<u8>>, TransportError>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), TransportError>;

    /// End the client's lifecycle. Pending and later pops fail with
    /// [`TransportError::Closed`].
    async fn close(&self);
}
