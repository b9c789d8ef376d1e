//! Type-safe identifier wrappers.
//!
//! Newtypes keep application IDs and correlation nonces from being mixed up
//! with ordinary strings (such as the activity state itself).
//!
//! | Type | Wraps | Purpose |
//! |------|-------|---------|
//! | [`ClientId`] | `String` | Discord application the activity is routed to |
//! | [`Nonce`] | `String` | Request/response correlation token |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// ClientId
// ============================================================================

/// Discord application (client) ID.
///
/// Fixed for the lifetime of a connection: the bridge learns it from the
/// handshake and there is no way to change it in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Creates a client ID.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for ClientId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ClientId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// Nonce
// ============================================================================

/// Correlation token pairing a request frame with its response.
///
/// Only needs to be unique within one connection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    /// Key used to correlate the handshake reply.
    ///
    /// Discord does not echo the handshake nonce; the reply carries `null`.
    pub const HANDSHAKE: &'static str = "null";

    /// Generates a fresh random nonce.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the nonce used to correlate the handshake reply.
    #[inline]
    #[must_use]
    pub fn handshake() -> Self {
        Self(Self::HANDSHAKE.to_string())
    }

    /// Maps a wire `nonce` field to a lookup key.
    ///
    /// `null` maps to [`Nonce::HANDSHAKE`]; non-string scalars use their
    /// JSON text.
    #[must_use]
    pub fn from_wire(value: &Value) -> Self {
        match value {
            Value::Null => Self::handshake(),
            Value::String(s) => Self(s.clone()),
            other => Self(other.to_string()),
        }
    }

    /// Returns the nonce as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
