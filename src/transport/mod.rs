//! Native-messaging transport layer.
//!
//! This module handles communication between the extension side (Rust) and
//! chrome-discord-bridge over the bridge process's stdio.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌──────────────────┐
//! │  ActivityManager │     length-prefixed JSON     │  chrome-discord- │
//! │                  │◄────────────────────────────►│  bridge          │
//! │  → Connection    │        stdin / stdout        │  → Discord IPC   │
//! └──────────────────┘                              └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `NativeHostFactory` spawns the bridge process
//! 2. `Connection` - Send handshake, then activity updates
//! 3. `Connection::disconnect` or bridge exit - pending requests rejected,
//!    process reaped
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Connection and event loop |
//! | `process` | Bridge process guard |

// ============================================================================
// Submodules
// ============================================================================

/// Native-messaging connection and event loop.
pub mod connection;

/// Bridge process ownership.
pub mod process;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use process::ProcessGuard;
