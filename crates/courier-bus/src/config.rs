//! Broker configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use courier_bus::BrokerConfigBuilder;
//!
//! let config = BrokerConfigBuilder::new(ServiceId(7))
//!     .request_ttl_secs(30)
//!     .max_in_flight(64)
//!     .build()?;
//! ```

use std::num::NonZeroU64;

use courier_types::{ServiceId, DEFAULT_REQUEST_TTL_SECS, DEFAULT_RESPONSE_TTL_SECS, MAX_TTL_SECS};
use tokio::sync::Semaphore;

use crate::error::BrokerError;

/// Default cap on concurrently running handlers per dispatcher.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1024;

/// How a dispatcher fans out work to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Spawn one task per request with no upper bound.
    Unbounded,
    /// At most `max_in_flight` handlers run at once. The dispatcher stops
    /// dequeuing while saturated.
    Bounded { max_in_flight: usize },
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::Bounded {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Broker configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Service this broker receives requests for.
    pub service: ServiceId,
    /// Lifetime applied to address queues when a request carries `Ttl::Default`.
    pub request_ttl_secs: NonZeroU64,
    /// Lifetime applied to correlation queues when a response carries `Ttl::Default`.
    pub response_ttl_secs: NonZeroU64,
    /// Handler fan-out policy.
    pub dispatch: DispatchPolicy,
}

impl BrokerConfig {
    /// Defaults for the given service.
    pub fn new(service: ServiceId) -> Self {
        Self {
            service,
            request_ttl_secs: default_ttl(DEFAULT_REQUEST_TTL_SECS),
            response_ttl_secs: default_ttl(DEFAULT_RESPONSE_TTL_SECS),
            dispatch: DispatchPolicy::default(),
        }
    }

    /// Check invariants the type system does not cover.
    pub fn validate(&self) -> Result<(), BrokerError> {
        if let DispatchPolicy::Bounded { max_in_flight: 0 } = self.dispatch {
            return Err(BrokerError::InvalidConfig(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        if let DispatchPolicy::Bounded { max_in_flight } = self.dispatch {
            if max_in_flight > Semaphore::MAX_PERMITS {
                return Err(BrokerError::InvalidConfig(format!(
                    "max_in_flight must be at most {}",
                    Semaphore::MAX_PERMITS
                )));
            }
        }
        for (name, ttl) in [
            ("request_ttl_secs", self.request_ttl_secs),
            ("response_ttl_secs", self.response_ttl_secs),
        ] {
            if ttl.get() > MAX_TTL_SECS {
                return Err(BrokerError::InvalidConfig(format!(
                    "{name} must be at most {MAX_TTL_SECS}"
                )));
            }
        }
        Ok(())
    }
}

fn default_ttl(secs: u64) -> NonZeroU64 {
    NonZeroU64::new(secs).unwrap_or(NonZeroU64::MIN)
}

/// Builder for [`BrokerConfig`] with validation
///
/// TTLs of `0` keep the defaults.
#[derive(Debug)]
pub struct BrokerConfigBuilder {
    service: ServiceId,
    request_ttl_secs: Option<u64>,
    response_ttl_secs: Option<u64>,
    dispatch: Option<DispatchPolicy>,
}

impl BrokerConfigBuilder {
    pub fn new(service: ServiceId) -> Self {
        Self {
            service,
            request_ttl_secs: None,
            response_ttl_secs: None,
            dispatch: None,
        }
    }

    pub fn request_ttl_secs(mut self, secs: u64) -> Self {
        self.request_ttl_secs = Some(secs);
        self
    }

    pub fn response_ttl_secs(mut self, secs: u64) -> Self {
        self.response_ttl_secs = Some(secs);
        self
    }

    /// Bound concurrent handlers.
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.dispatch = Some(DispatchPolicy::Bounded { max_in_flight });
        self
    }

    /// Spawn a handler per request without a bound.
    pub fn unbounded(mut self) -> Self {
        self.dispatch = Some(DispatchPolicy::Unbounded);
        self
    }

    pub fn dispatch(mut self, dispatch: DispatchPolicy) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Build the config, validating all parameters
    pub fn build(self) -> Result<BrokerConfig, BrokerError> {
        let defaults = BrokerConfig::new(self.service);

        let config = BrokerConfig {
            service: self.service,
            request_ttl_secs: self
                .request_ttl_secs
                .and_then(NonZeroU64::new)
                .unwrap_or(defaults.request_ttl_secs),
            response_ttl_secs: self
                .response_ttl_secs
                .and_then(NonZeroU64::new)
                .unwrap_or(defaults.response_ttl_secs),
            dispatch: self.dispatch.unwrap_or(defaults.dispatch),
        };

        config.validate()?;
        Ok(config)
    }
}
