//! # Error Types
//!
//! Errors raised while encoding or decoding broker data.

use thiserror::Error;

/// Errors from the envelope codec and key parsing.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A payload or envelope could not be serialized.
    #[error("Encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Bytes read from the transport are not a valid envelope or payload.
    #[error("Decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// A transport key is not of the form `"{service}:{route}"`.
    #[error("Invalid address key: {key}")]
    InvalidAddressKey { key: String },

    /// A string is not a well-formed correlation id.
    #[error("Invalid correlation id: {value}")]
    InvalidCorrelationId { value: String },
}
