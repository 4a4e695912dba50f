//! Adapters connecting the broker to process-wide infrastructure.

pub mod metrics;

pub use metrics::PrometheusRecorder;
