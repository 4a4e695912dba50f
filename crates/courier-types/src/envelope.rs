//! # Request Envelope
//!
//! The wire wrapper for every request pushed onto an address queue.
//!
//! ## Wire Format
//!
//! ```text
//! {"id": "<correlation-id>", "data": <payload>}
//! ```
//!
//! - `id` tells the dispatcher where to push the response.
//! - `data` is the caller's payload, carried untouched.
//!
//! Responses are not enveloped: the response queue is already unique to one
//! request, so its items are the bare JSON-encoded payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::correlation::CorrelationId;
use crate::errors::CodecError;
use crate::ttl::Ttl;

/// A request as it travels through the address queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope<T = serde_json::Value> {
    /// Correlation id of the request; the key of its response queue.
    pub id: CorrelationId,
    /// Opaque caller payload.
    pub data: T,
}

impl<T> RequestEnvelope<T> {
    /// Wrap a payload under a correlation id.
    #[must_use]
    pub fn new(id: CorrelationId, data: T) -> Self {
        Self { id, data }
    }
}

impl<T: Serialize> RequestEnvelope<T> {
    /// Serialize into the wire format.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Encode)
    }
}

impl<T: DeserializeOwned> RequestEnvelope<T> {
    /// Parse the wire format.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }
}

/// Encode a bare payload (the response wire format).
pub fn encode_payload<T: Serialize>(payload: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(payload).map_err(CodecError::Encode)
}

/// Decode a bare payload (the response wire format).
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}

/// Caller-facing request: where to send it, what to send, and how long the
/// address queue should stay alive.
#[derive(Debug, Clone, PartialEq)]
pub struct Request<T = serde_json::Value> {
    /// Destination queue.
    pub address: Address,
    /// Opaque payload.
    pub payload: T,
    /// Lifetime of the address queue after this push.
    pub ttl: Ttl,
}

impl<T> Request<T> {
    /// Request with the broker's default queue lifetime.
    #[must_use]
    pub fn new(address: Address, payload: T) -> Self {
        Self {
            address,
            payload,
            ttl: Ttl::Default,
        }
    }

    /// Override the address queue lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Handler-facing response: what to answer and how long the correlation
/// queue should stay alive.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T = serde_json::Value> {
    /// Opaque payload.
    pub payload: T,
    /// Lifetime of the correlation queue after this push.
    pub ttl: Ttl,
}

impl<T> Response<T> {
    /// Response with the broker's default queue lifetime.
    #[must_use]
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            ttl: Ttl::Default,
        }
    }

    /// Override the correlation queue lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }
}
