//! # Courier Types Crate
//!
//! The data model of the request/response broker.
//!
//! ## Design Principles
//!
//! - **Deterministic Addressing**: An [`Address`] maps to exactly one transport
//!   key, `"{service}:{route}"`, and distinct addresses never share a key.
//! - **Unique Correlation**: Every request mints a fresh [`CorrelationId`]
//!   which doubles as the key of its response queue.
//! - **Opaque Payloads**: The broker never interprets payloads; it only
//!   round-trips them through the JSON envelope.
//! - **Whole-Key Expiry**: [`Ttl`] applies to a transport key, never to an
//!   individual queued item.

pub mod address;
pub mod correlation;
pub mod envelope;
pub mod errors;
pub mod ttl;

pub use address::{Address, RouteId, ServiceId, ADDRESS_SEPARATOR};
pub use correlation::CorrelationId;
pub use envelope::{decode_payload, encode_payload, Request, RequestEnvelope, Response};
pub use errors::CodecError;
pub use ttl::{
    Ttl, WaitTimeout, DEFAULT_REQUEST_TTL_SECS, DEFAULT_RESPONSE_TTL_SECS, MAX_TTL_SECS,
    MAX_WAIT_SECS,
};
