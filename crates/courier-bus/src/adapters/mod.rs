//! Adapters Layer (Driven Adapters)
//!
//! Implementations of [`QueueTransport`](crate::ports::QueueTransport).
//!
//! - `InMemoryTransport` - single-process store, used by tests and demos
//! - `RedisTransport` - Redis lists via a pooled client (feature `redis`)

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::InMemoryTransport;
#[cfg(feature = "redis")]
pub use self::redis::{RedisTransport, COMMAND_CHECKOUT_TIMEOUT, DEFAULT_POOL_SIZE};
