//! Browser Activity - Discord Rich Presence for browser tabs.
//!
//! This library publishes a short activity string ("Reviewing kanji") to
//! the Discord desktop client through chrome-discord-bridge, a
//! native-messaging host that relays frames to Discord's local IPC socket.
//!
//! # Architecture
//!
//! - **Manager**: [`ActivityManager`] accepts bursts of updates, runs one
//!   operation at a time and sends only the latest parameters
//! - **Transport**: [`Connection`] frames JSON over the bridge's stdio and
//!   correlates replies by nonce
//! - **Bridge**: [`NativeHostFactory`] finds the host manifest and spawns
//!   the bridge process
//!
//! Key design principles:
//!
//! - One connection per client ID; changing the ID reconnects
//! - Identical updates are not resent
//! - Clearing the activity closes the connection
//!
//! # Quick Start
//!
//! ```no_run
//! use browser_activity::{ActivityManager, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = ActivityManager::new();
//!
//!     manager.set_activity("123456789012345678", "Reviewing kanji").await?;
//!     manager.set_activity("123456789012345678", "Adding cards").await?;
//!
//!     manager.clear_activity();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`activity`] | [`ActivityManager`] and its client seams |
//! | [`bridge`] | Host manifest lookup and bridge launch |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | [`ClientId`] and [`Nonce`] |
//! | [`protocol`] | Frame types and native-messaging codec |
//! | [`transport`] | Nonce-correlated connection |

// ============================================================================
// Modules
// ============================================================================

/// Activity publishing.
///
/// - [`ActivityManager`] - Serializes and coalesces updates
/// - [`ActivityClient`] - One connection, bound to a client ID
pub mod activity;

/// chrome-discord-bridge discovery and launch.
pub mod bridge;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Bridge protocol message types.
pub mod protocol;

/// Bridge transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Activity types
pub use activity::{ActivityClient, ActivityManager, ActivityUpdate, ClientFactory};

// Bridge types
pub use bridge::{BridgeOptions, HostManifest, NativeHostFactory};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ClientId, Nonce};

// Transport types
pub use transport::Connection;
