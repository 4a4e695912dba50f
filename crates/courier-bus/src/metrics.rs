//! Metrics hooks for broker operations
//!
//! [`BrokerMetrics`] is the built-in atomic collector. Implement
//! [`MetricsRecorder`] to feed an external system instead.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use courier_bus::{Broker, BrokerMetrics};
//!
//! let metrics = Arc::new(BrokerMetrics::new());
//! let broker = Broker::connect(transport, config).await?.with_metrics(metrics.clone());
//!
//! // ... later
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use courier_types::Address;

/// Metrics collector for broker operations
///
/// Thread-safe counters and one gauge.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
    /// Requests pushed onto address queues
    pub requests_sent: AtomicU64,
    /// Requests popped and decoded by a dispatcher
    pub requests_received: AtomicU64,
    /// Responses pushed onto correlation queues
    pub responses_sent: AtomicU64,
    /// Responses popped by a waiter
    pub responses_collected: AtomicU64,
    /// Waits that hit their deadline
    pub wait_timeouts: AtomicU64,
    /// Request items that failed to decode and were skipped
    pub decode_failures: AtomicU64,
    /// Handler tasks that panicked
    pub handler_panics: AtomicU64,
    /// Handlers currently running
    pub handlers_in_flight: AtomicU64,
}

impl BrokerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            requests_received: self.requests_received.load(Ordering::Relaxed),
            responses_sent: self.responses_sent.load(Ordering::Relaxed),
            responses_collected: self.responses_collected.load(Ordering::Relaxed),
            wait_timeouts: self.wait_timeouts.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
            handlers_in_flight: self.handlers_in_flight.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.requests_sent.store(0, Ordering::Relaxed);
        self.requests_received.store(0, Ordering::Relaxed);
        self.responses_sent.store(0, Ordering::Relaxed);
        self.responses_collected.store(0, Ordering::Relaxed);
        self.wait_timeouts.store(0, Ordering::Relaxed);
        self.decode_failures.store(0, Ordering::Relaxed);
        self.handler_panics.store(0, Ordering::Relaxed);
        self.handlers_in_flight.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub requests_received: u64,
    pub responses_sent: u64,
    pub responses_collected: u64,
    pub wait_timeouts: u64,
    pub decode_failures: u64,
    pub handler_panics: u64,
    pub handlers_in_flight: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this to integrate with Prometheus or another external system.
pub trait MetricsRecorder: Send + Sync {
    fn record_request_sent(&self, address: &Address);

    fn record_request_received(&self, address: &Address);

    fn record_response_sent(&self);

    /// A waiter collected a response after waiting `waited`.
    fn record_response_collected(&self, waited: Duration);

    fn record_wait_timeout(&self);

    fn record_decode_failure(&self, address: &Address);

    fn record_handler_panic(&self, address: &Address);

    /// A handler task started.
    fn record_handler_started(&self);

    /// A handler task finished, successfully or not.
    fn record_handler_finished(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Debug, Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_request_sent(&self, _: &Address) {}
    fn record_request_received(&self, _: &Address) {}
    fn record_response_sent(&self) {}
    fn record_response_collected(&self, _: Duration) {}
    fn record_wait_timeout(&self) {}
    fn record_decode_failure(&self, _: &Address) {}
    fn record_handler_panic(&self, _: &Address) {}
    fn record_handler_started(&self) {}
    fn record_handler_finished(&self) {}
}

impl MetricsRecorder for BrokerMetrics {
    fn record_request_sent(&self, _: &Address) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    fn record_request_received(&self, _: &Address) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_response_sent(&self) {
        self.responses_sent.fetch_add(1, Ordering::Relaxed);
    }

    fn record_response_collected(&self, _: Duration) {
        self.responses_collected.fetch_add(1, Ordering::Relaxed);
    }

    fn record_wait_timeout(&self) {
        self.wait_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_decode_failure(&self, _: &Address) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_handler_panic(&self, _: &Address) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    fn record_handler_started(&self) {
        self.handlers_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    fn record_handler_finished(&self) {
        // Saturate so a reset while handlers run cannot wrap the gauge.
        let _ = self
            .handlers_in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            });
    }
}
