//! chrome-discord-bridge discovery and launch.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BridgeOptions`] | Host name, search directories, launch arguments |
//! | [`HostManifest`] | Parsed native-messaging host manifest |
//! | [`NativeHostFactory`] | Default [`ClientFactory`](crate::ClientFactory) |
//!
//! # Example
//!
//! ```no_run
//! use browser_activity::{ActivityManager, BridgeOptions, NativeHostFactory};
//!
//! # async fn example() -> browser_activity::Result<()> {
//! let factory = NativeHostFactory::new(
//!     BridgeOptions::new().with_origin("chrome-extension://abcdefghijklmnop/"),
//! );
//! let manager = ActivityManager::with_factory(factory);
//!
//! manager.set_activity("123456", "Reviewing kanji").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Default connection factory.
pub mod launcher;

/// Native-messaging host manifest lookup.
pub mod manifest;

/// Bridge launch options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use launcher::NativeHostFactory;
pub use manifest::HostManifest;
pub use options::{BridgeOptions, DEFAULT_HOST_NAME};
