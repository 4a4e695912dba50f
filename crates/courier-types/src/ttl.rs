//! # Expiry and Wait Durations
//!
//! The transport speaks whole seconds. [`Ttl`] is the lifetime of a whole
//! queue key, refreshed on every push. [`WaitTimeout`] is how long a waiter
//! blocks on a response queue; infinite waiting must be asked for by name.

use std::num::NonZeroU64;
use std::time::Duration;

/// Default lifetime of an address (request) queue, in seconds.
pub const DEFAULT_REQUEST_TTL_SECS: u64 = 60;

/// Default lifetime of a correlation (response) queue, in seconds.
pub const DEFAULT_RESPONSE_TTL_SECS: u64 = 60;

/// Longest key lifetime accepted, in seconds (100 years).
///
/// Larger values overflow clock arithmetic and are rejected by Redis
/// `EXPIRE`, which would leave a pushed item without an expiry.
pub const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Longest finite wait accepted, in seconds. Use [`WaitTimeout::Forever`]
/// for an unbounded wait.
pub const MAX_WAIT_SECS: u64 = MAX_TTL_SECS;

/// Lifetime applied to a transport key when an item is pushed onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the broker-wide default for this kind of queue.
    #[default]
    Default,
    /// Explicit lifetime in whole seconds.
    Secs(NonZeroU64),
}

impl Ttl {
    /// Build from whole seconds; `0` selects the broker default.
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        NonZeroU64::new(secs).map_or(Self::Default, Self::Secs)
    }

    /// Build from a duration, rounding any fractional second up.
    ///
    /// A zero duration selects the broker default.
    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_secs(ceil_secs(duration))
    }

    /// Seconds to apply on the wire.
    #[must_use]
    pub fn resolve(self, default: NonZeroU64) -> u64 {
        match self {
            Self::Default => default.get(),
            Self::Secs(secs) => secs.get(),
        }
    }

    /// [`Ttl::resolve`], or `None` past [`MAX_TTL_SECS`].
    #[must_use]
    pub fn checked_resolve(self, default: NonZeroU64) -> Option<u64> {
        Some(self.resolve(default)).filter(|secs| *secs <= MAX_TTL_SECS)
    }
}

/// How long to block waiting for a response.
///
/// `Forever` can hang the caller indefinitely if no responder ever fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTimeout {
    /// Give up after this long.
    After(Duration),
    /// Block until a response arrives, with no upper bound.
    Forever,
}

impl WaitTimeout {
    /// Wait at most `secs` seconds.
    ///
    /// `0` maps to [`WaitTimeout::Forever`], matching the transport's
    /// blocking-pop convention. Prefer naming `Forever` explicitly.
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Self::Forever
        } else {
            Self::After(Duration::from_secs(secs))
        }
    }

    /// Timeout in the transport's whole-second convention (`0` = forever).
    ///
    /// Sub-second timeouts round up to one second so they never turn into an
    /// infinite wait.
    #[must_use]
    pub fn as_block_secs(self) -> u64 {
        match self {
            Self::Forever => 0,
            Self::After(duration) => ceil_secs(duration).max(1),
        }
    }

    /// [`WaitTimeout::as_block_secs`], or `None` if a finite wait is longer
    /// than [`MAX_WAIT_SECS`].
    #[must_use]
    pub fn checked_block_secs(self) -> Option<u64> {
        Some(self.as_block_secs()).filter(|secs| *secs <= MAX_WAIT_SECS)
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}
