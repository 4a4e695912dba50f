//! # Courier Bus - Request/Response Broker
//!
//! Lets independent services exchange requests and responses through a
//! shared queue store such as Redis, without knowing each other's location.
//!
//! ## Architecture
//!
//! Hexagonal (Ports & Adapters):
//!
//! - **Ports** (`ports/`)
//!   - `QueueTransport`: driven port, the shared store
//!   - `RequestHandler`: driving port, application logic per route
//! - **Adapters** (`adapters/`)
//!   - `InMemoryTransport`: single-process store
//!   - `RedisTransport`: pooled Redis client (feature `redis`)
//! - **Service** (`service/`)
//!   - `Broker`: send, receive, respond, wait
//!   - `Responder`: reply handle for one request
//!
//! ## Messaging Model
//!
//! ```text
//! ┌──────────┐  send   ┌────────────────────┐  receive  ┌──────────┐
//! │  Caller  │ ──────▶ │ "{service}:{route}"│ ────────▶ │ Service  │
//! │          │         └────────────────────┘           │          │
//! │          │  wait   ┌────────────────────┐  respond  │          │
//! │          │ ◀────── │  "{correlation}"   │ ◀──────── │          │
//! └──────────┘         └────────────────────┘           └──────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Each queued item is delivered to at most one consumer.
//! - Items on one queue are delivered in push order.
//! - Queues expire as a whole; every push refreshes the expiry.
//! - Nothing is retried or acknowledged. A request popped by a consumer that
//!   then dies is lost.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::InMemoryTransport;
#[cfg(feature = "redis")]
pub use adapters::{RedisTransport, COMMAND_CHECKOUT_TIMEOUT, DEFAULT_POOL_SIZE};
pub use config::{BrokerConfig, BrokerConfigBuilder, DispatchPolicy, DEFAULT_MAX_IN_FLIGHT};
pub use error::{BrokerError, TransportError};
pub use metrics::{BrokerMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{QueueTransport, RequestHandler};
pub use service::{Broker, DecodeFailure, Responder};

pub use courier_types as types;
