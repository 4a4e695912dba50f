//! Prometheus metrics for Courier brokers.
//!
//! All metrics follow the naming convention: `courier_<metric>_<unit>`.
//! Per-address series carry an `address` label in `service:route` form.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // REQUEST METRICS
    // =========================================================================

    /// Requests pushed onto address queues
    pub static ref REQUESTS_SENT: IntCounterVec = IntCounterVec::new(
        Opts::new("courier_requests_sent_total", "Requests pushed onto address queues"),
        &["address"]
    ).expect("metric creation failed");

    /// Requests popped and decoded by dispatchers
    pub static ref REQUESTS_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("courier_requests_received_total", "Requests taken off address queues"),
        &["address"]
    ).expect("metric creation failed");

    /// Malformed request items skipped by dispatchers
    pub static ref DECODE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("courier_decode_failures_total", "Request items that failed to decode"),
        &["address"]
    ).expect("metric creation failed");

    // =========================================================================
    // RESPONSE METRICS
    // =========================================================================

    /// Responses pushed onto correlation queues
    pub static ref RESPONSES_SENT: IntCounter = IntCounter::new(
        "courier_responses_sent_total",
        "Responses pushed onto correlation queues"
    ).expect("metric creation failed");

    /// Responses collected by waiters
    pub static ref RESPONSES_COLLECTED: IntCounter = IntCounter::new(
        "courier_responses_collected_total",
        "Responses popped by waiters"
    ).expect("metric creation failed");

    /// Waits that hit their deadline
    pub static ref WAIT_TIMEOUTS: IntCounter = IntCounter::new(
        "courier_wait_timeouts_total",
        "Waits that ended without a response"
    ).expect("metric creation failed");

    /// Time from starting a wait to collecting the response
    pub static ref WAIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "courier_wait_duration_seconds",
            "Time spent waiting for a response"
        ).buckets(exponential_buckets(0.0005, 2.0, 16).expect("metric creation failed"))
    ).expect("metric creation failed");

    // =========================================================================
    // HANDLER METRICS
    // =========================================================================

    /// Handlers currently running
    pub static ref HANDLERS_IN_FLIGHT: IntGauge = IntGauge::new(
        "courier_handlers_in_flight",
        "Request handlers currently running"
    ).expect("metric creation failed");

    /// Handlers that panicked
    pub static ref HANDLER_PANICS: IntCounterVec = IntCounterVec::new(
        Opts::new("courier_handler_panics_total", "Request handlers that panicked"),
        &["address"]
    ).expect("metric creation failed");
}

/// Register all collectors with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Requests
        Box::new(REQUESTS_SENT.clone()),
        Box::new(REQUESTS_RECEIVED.clone()),
        Box::new(DECODE_FAILURES.clone()),
        // Responses
        Box::new(RESPONSES_SENT.clone()),
        Box::new(RESPONSES_COLLECTED.clone()),
        Box::new(WAIT_TIMEOUTS.clone()),
        Box::new(WAIT_DURATION.clone()),
        // Handlers
        Box::new(HANDLERS_IN_FLIGHT.clone()),
        Box::new(HANDLER_PANICS.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
