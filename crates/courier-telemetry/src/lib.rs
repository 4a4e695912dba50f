//! # Courier Telemetry
//!
//! Structured logging and Prometheus metrics for Courier services.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use courier_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `COURIER_SERVICE_NAME` | `courier` | Service name in startup logs |
//! | `COURIER_LOG_LEVEL` | `RUST_LOG`, then `info` | Log filter |
//! | `COURIER_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `COURIER_JSON_LOGS` | `true` in containers | JSON log lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, DECODE_FAILURES, HANDLERS_IN_FLIGHT, HANDLER_PANICS,
    REQUESTS_RECEIVED, REQUESTS_SENT, RESPONSES_COLLECTED, RESPONSES_SENT, WAIT_DURATION,
    WAIT_TIMEOUTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the logging subscriber.
///
/// Hold the returned guard for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Keeps telemetry alive; logs a final metrics dump when dropped.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        match encode_metrics() {
            Ok(text) => tracing::debug!(service = %self.service_name, metrics = %text, "final metrics"),
            Err(e) => tracing::warn!(error = %e, "could not encode final metrics"),
        }
        tracing::info!(service = %self.service_name, "shutting down telemetry");
    }
}
