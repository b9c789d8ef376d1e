//! Native-messaging protocol message types.
//!
//! This module defines the frames exchanged with chrome-discord-bridge and
//! the length-prefixed codec that carries them.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `Handshake` | Extension → Bridge | Establish client identity |
//! | `ActivityFrame` | Extension → Bridge | Publish activity state |
//! | `Response` | Bridge → Extension | Reply correlated by nonce |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `codec` | Length-prefixed JSON framing |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Length-prefixed JSON framing.
pub mod codec;

/// Request and Response frame types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use request::{
    Activity, ActivityArgs, ActivityFrame, DISPATCH, Handshake, PROTOCOL_VERSION, Request,
    Response, SET_ACTIVITY,
};
