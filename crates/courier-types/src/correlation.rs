//! # Correlation Ids
//!
//! A correlation id names the response channel of exactly one request. It is
//! minted by the sender, carried inside the request envelope, and used
//! verbatim as the transport key of the response queue.
//!
//! Ids are random v4 UUIDs (122 bits of entropy), so collisions are not a
//! practical concern even with millions of outstanding requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CodecError;

/// Unique token identifying one request's response channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Mint a fresh random correlation id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Transport key of the response queue for this id.
    #[must_use]
    pub fn as_key(&self) -> String {
        self.to_string()
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for CorrelationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for CorrelationId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CodecError::InvalidCorrelationId {
                value: s.to_string(),
            })
    }
}
