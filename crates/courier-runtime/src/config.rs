//! # Node Configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```toml
//! [broker]
//! redis_url = "redis://127.0.0.1:6379"
//! service = 1
//! request_ttl_secs = 60
//! response_ttl_secs = 60
//! max_in_flight = 1024
//! pool_size = 16
//!
//! [demo]
//! enabled = true
//! route = 1
//! interval_secs = 2
//! wait_timeout_secs = 5
//! response_ttl_secs = 5
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use courier_bus::{BrokerConfig, BrokerConfigBuilder, BrokerError, DEFAULT_MAX_IN_FLIGHT, DEFAULT_POOL_SIZE};
use courier_types::{RouteId, ServiceId, Ttl, WaitTimeout, DEFAULT_REQUEST_TTL_SECS, DEFAULT_RESPONSE_TTL_SECS};
use serde::Deserialize;
use thiserror::Error;

/// Smallest accepted `[broker] pool_size`.
pub const MIN_POOL_SIZE: usize = 2;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Broker and transport settings.
    pub broker: BrokerSection,
    /// Ping/pong demo settings.
    pub demo: DemoSection,
}

/// `[broker]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerSection {
    /// Redis connection URL.
    pub redis_url: String,
    /// Service code this node receives requests for.
    pub service: i64,
    /// Address queue lifetime; `0` keeps the default.
    pub request_ttl_secs: u64,
    /// Correlation queue lifetime; `0` keeps the default.
    pub response_ttl_secs: u64,
    /// Concurrent handler cap; `0` disables the cap.
    pub max_in_flight: usize,
    /// Redis connections per pool; at least 2, one for the dispatcher's
    /// blocking pop and one for a concurrent waiter.
    pub pool_size: usize,
}

impl Default for BrokerSection {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            service: 1,
            request_ttl_secs: DEFAULT_REQUEST_TTL_SECS,
            response_ttl_secs: DEFAULT_RESPONSE_TTL_SECS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

/// `[demo]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoSection {
    /// Run the ping/pong demo.
    pub enabled: bool,
    /// Route the demo serves and calls.
    pub route: i64,
    /// Pause between pings; at least 1.
    pub interval_secs: u64,
    /// How long each ping waits for its pong; `0` waits forever.
    pub wait_timeout_secs: u64,
    /// Lifetime of each pong's correlation queue; `0` uses the broker default.
    pub response_ttl_secs: u64,
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            enabled: true,
            route: 1,
            interval_secs: 2,
            wait_timeout_secs: 5,
            response_ttl_secs: 5,
        }
    }
}

impl DemoSection {
    pub fn route(&self) -> RouteId {
        RouteId(self.route)
    }

    /// Pause between pings. A section built by hand with `0` still pauses
    /// one second; loaded configs reject `0` in [`NodeConfig::validate`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn wait_timeout(&self) -> WaitTimeout {
        WaitTimeout::from_secs(self.wait_timeout_secs)
    }

    pub fn response_ttl(&self) -> Ttl {
        Ttl::from_secs(self.response_ttl_secs)
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check settings that the broker builder does not see.
    pub fn validate(&self) -> Result<(), BrokerError> {
        if self.broker.pool_size < MIN_POOL_SIZE {
            return Err(BrokerError::InvalidConfig(format!(
                "broker.pool_size must be at least {MIN_POOL_SIZE}"
            )));
        }
        if self.demo.interval_secs == 0 {
            return Err(BrokerError::InvalidConfig(
                "demo.interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Broker settings, validated together with the rest of the node config.
    pub fn broker_config(&self) -> Result<BrokerConfig, BrokerError> {
        self.validate()?;

        let builder = BrokerConfigBuilder::new(ServiceId(self.broker.service))
            .request_ttl_secs(self.broker.request_ttl_secs)
            .response_ttl_secs(self.broker.response_ttl_secs);

        let builder = match self.broker.max_in_flight {
            0 => builder.unbounded(),
            max => builder.max_in_flight(max),
        };

        builder.build()
    }
}

/// Errors that can occur during config loading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// File I/O error.
    #[error("could not read config file {path}: {error}")]
    Io { path: String, error: String },

    /// TOML syntax or schema error.
    #[error("could not parse config: {0}")]
    Parse(String),
}
