//! Error types for browser-activity.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use browser_activity::{ActivityManager, Result};
//!
//! async fn example(manager: &ActivityManager) -> Result<()> {
//!     manager.set_activity("123456", "Reviewing kanji").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::HostNotFound`], [`Error::Manifest`] |
//! | Connection | [`Error::ProcessLaunchFailed`], [`Error::NotConnected`], [`Error::Disconnected`] |
//! | Protocol | [`Error::Protocol`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when bridge options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// No native-messaging host manifest was found.
    ///
    /// Usually means chrome-discord-bridge is not installed.
    #[error("Native messaging host not found: {name}")]
    HostNotFound {
        /// Host name that was looked up.
        name: String,
    },

    /// The host manifest exists but cannot be used.
    #[error("Invalid host manifest {path}: {message}")]
    Manifest {
        /// Path of the manifest file.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Failed to launch the bridge process.
    #[error("Failed to launch native messaging host: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    /// Operation attempted on a connection that was already torn down.
    ///
    /// The request was never sent.
    #[error("not connected")]
    NotConnected,

    /// The connection died while a request was waiting for its response.
    ///
    /// The request may have reached the bridge.
    #[error("disconnected: {reason}")]
    Disconnected {
        /// Why the connection ended.
        reason: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation.
    ///
    /// Returned for malformed or oversize frames and duplicate nonces.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a host not found error.
    #[inline]
    pub fn host_not_found(name: impl Into<String>) -> Self {
        Self::HostNotFound { name: name.into() }
    }

    /// Creates a manifest error.
    #[inline]
    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a disconnected error.
    #[inline]
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected {
            reason: reason.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ProcessLaunchFailed { .. }
                | Self::NotConnected
                | Self::Disconnected { .. }
                | Self::ChannelClosed(_)
        )
    }

    /// Returns `true` if the bridge is missing or misconfigured.
    #[inline]
    #[must_use]
    pub fn is_installation_error(&self) -> bool {
        matches!(
            self,
            Self::HostNotFound { .. } | Self::Manifest { .. } | Self::Config { .. }
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on the next update, which opens a
    /// fresh connection.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Disconnected { .. } | Self::ChannelClosed(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::disconnected("host disconnected");
        assert_eq!(err.to_string(), "disconnected: host disconnected");
        assert_eq!(Error::NotConnected.to_string(), "not connected");
    }

    #[test]
    fn test_host_not_found_display() {
        let err = Error::host_not_found("io.github.p00ya.cdb");
        assert_eq!(
            err.to_string(),
            "Native messaging host not found: io.github.p00ya.cdb"
        );
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::disconnected("x").is_connection_error());
        assert!(!Error::protocol("x").is_connection_error());
        assert!(!Error::host_not_found("x").is_connection_error());
    }

    #[test]
    fn test_is_installation_error() {
        assert!(Error::host_not_found("x").is_installation_error());
        assert!(Error::manifest("/tmp/x.json", "bad").is_installation_error());
        assert!(!Error::NotConnected.is_installation_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::disconnected("x").is_recoverable());
        assert!(!Error::config("x").is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
