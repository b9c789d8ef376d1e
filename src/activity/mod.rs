//! Activity publishing.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ActivityManager`] | Serializes and coalesces activity updates |
//! | [`ActivityUpdate`] | Future for the outcome of one update |
//! | [`ActivityClient`] | One connection bound to a client ID |
//! | [`ClientFactory`] | Opens connections for the manager |

// ============================================================================
// Submodules
// ============================================================================

/// Connection and factory traits.
pub mod client;

/// Update serialization and coalescing.
pub mod manager;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ActivityClient, ClientFactory};
pub use manager::{ActivityManager, ActivityUpdate};
