//! # Addressing
//!
//! Maps a (service, route) pair onto the transport key of its request queue.
//!
//! The key is the canonical decimal text of both integers joined by
//! [`ADDRESS_SEPARATOR`]. Ids are signed 64-bit, so peers may use negative
//! codes; decimal text (digits and an optional `-`) never contains the
//! separator, so the mapping is injective.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CodecError;

/// Separator between the service and route components of an address key.
pub const ADDRESS_SEPARATOR: char = ':';

/// Identity of a service process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub i64);

/// A handler-addressable endpoint within one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub i64);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ServiceId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<i64> for RouteId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Logical request queue: one route of one service.
///
/// Two addresses are equal iff both components match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Target service.
    pub service: ServiceId,
    /// Route within the target service.
    pub route: RouteId,
}

impl Address {
    /// Create an address from raw integer components.
    #[must_use]
    pub const fn new(service: i64, route: i64) -> Self {
        Self {
            service: ServiceId(service),
            route: RouteId(route),
        }
    }

    /// Create an address from typed components.
    #[must_use]
    pub const fn from_ids(service: ServiceId, route: RouteId) -> Self {
        Self { service, route }
    }

    /// Transport key of this address's request queue.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parse a transport key back into an address.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::InvalidAddressKey` unless the key is exactly two
    /// canonical integers joined by the separator.
    pub fn parse_key(key: &str) -> Result<Self, CodecError> {
        let invalid = || CodecError::InvalidAddressKey {
            key: key.to_string(),
        };

        let (service, route) = key.split_once(ADDRESS_SEPARATOR).ok_or_else(invalid)?;
        let service = parse_component(service).ok_or_else(invalid)?;
        let route = parse_component(route).ok_or_else(invalid)?;

        Ok(Self::new(service, route))
    }
}

/// Parse one key component, accepting only the canonical form that
/// `Display` produces (no `+`, no `-0`, no leading zeros).
fn parse_component(text: &str) -> Option<i64> {
    let value: i64 = text.parse().ok()?;
    (value.to_string() == text).then_some(value)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.service, ADDRESS_SEPARATOR, self.route)
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_key(s)
    }
}
