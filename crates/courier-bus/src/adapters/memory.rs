//! # In-Memory Transport
//!
//! Single-process implementation of [`QueueTransport`] with the semantics of
//! the shared store: FIFO lists, whole-key expiry, blocking pop and
//! at-most-once delivery across competing poppers.
//!
//! Expiry is measured on the tokio clock, so tests can pause and advance
//! time instead of sleeping.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use courier_types::MAX_TTL_SECS;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::TransportError;
use crate::ports::QueueTransport;

struct Entry {
    items: VecDeque<Vec<u8>>,
    expires_at: Instant,
}

#[derive(Default)]
struct State {
    keys: HashMap<String, Entry>,
    closed: bool,
}

impl State {
    /// Live entry for `key`, dropping it first if it has expired.
    fn live_entry(&mut self, key: &str, now: Instant) -> Option<&mut Entry> {
        if self.keys.get(key).is_some_and(|e| e.expires_at <= now) {
            self.keys.remove(key);
        }
        self.keys.get_mut(key)
    }

    fn pop_front(&mut self, key: &str, now: Instant) -> Option<Vec<u8>> {
        let entry = self.live_entry(key, now)?;
        let item = entry.items.pop_front();
        // An emptied list disappears, like the store deletes it.
        if entry.items.is_empty() {
            self.keys.remove(key);
        }
        item
    }
}

/// In-memory queue store.
///
/// Suitable for tests and single-node deployments; multi-process deployments
/// use the Redis adapter.
#[derive(Default)]
pub struct InMemoryTransport {
    state: Mutex<State>,
    /// Woken on every push and on close; poppers re-check their key.
    changed: Notify,
}

impl InMemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live items queued under `key`.
    #[must_use]
    pub fn len(&self, key: &str) -> usize {
        let mut state = self.state.lock();
        state
            .live_entry(key, Instant::now())
            .map_or(0, |e| e.items.len())
    }

    /// True if nothing is queued under `key`.
    #[must_use]
    pub fn is_empty(&self, key: &str) -> bool {
        self.len(key) == 0
    }

    /// Whether `key` exists and has not expired.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        state.live_entry(key, Instant::now()).is_some()
    }

    /// Time left before `key` expires, if it exists.
    #[must_use]
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut state = self.state.lock();
        state
            .live_entry(key, now)
            .map(|e| e.expires_at.saturating_duration_since(now))
    }

    /// Whether [`QueueTransport::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[async_trait]
impl QueueTransport for InMemoryTransport {
    async fn push_with_expiry(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_secs: u64,
    ) -> Result<(), TransportError> {
        let now = Instant::now();
        // Checked before touching the list so a rejected TTL pushes nothing.
        let expires_at = Some(ttl_secs)
            .filter(|secs| *secs <= MAX_TTL_SECS)
            .and_then(|secs| now.checked_add(Duration::from_secs(secs)))
            .ok_or_else(|| TransportError::Protocol(format!("invalid expire time {ttl_secs}")))?;

        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(TransportError::Closed);
            }

            if ttl_secs == 0 {
                // EXPIRE 0 deletes the key outright.
                state.keys.remove(key);
                return Ok(());
            }

            match state.live_entry(key, now) {
                Some(entry) => {
                    entry.items.push_back(value);
                    entry.expires_at = expires_at;
                }
                None => {
                    state.keys.insert(
                        key.to_string(),
                        Entry {
                            items: VecDeque::from([value]),
                            expires_at,
                        },
                    );
                }
            }
        }

        trace!(key, ttl_secs, "pushed");
        self.changed.notify_waiters();
        Ok(())
    }

    async fn blocking_pop(
        &self,
        key: &str,
        timeout_secs: u64,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        // A deadline past the clock's range is as good as none.
        let deadline = (timeout_secs > 0)
            .then(|| Instant::now().checked_add(Duration::from_secs(timeout_secs)))
            .flatten();

        loop {
            // Register interest before checking state so a push between the
            // check and the await is not missed.
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(TransportError::Closed);
                }
                if let Some(item) = state.pop_front(key, Instant::now()) {
                    return Ok(Some(item));
                }
            }

            match deadline {
                None => notified.await,
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
            }
        }
    }

    async fn ping(&self) -> Result<(), TransportError> {
        if self.state.lock().closed {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    async fn close(&self) {
        self.state.lock().closed = true;
        debug!("in-memory transport closed");
        self.changed.notify_waiters();
    }
}
