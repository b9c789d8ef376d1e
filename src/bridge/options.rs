//! Bridge launch options.
//!
//! Provides a type-safe interface for configuring how the native-messaging
//! host is found and launched.
//!
//! # Example
//!
//! ```ignore
//! use browser_activity::BridgeOptions;
//!
//! let options = BridgeOptions::new()
//!     .with_origin("chrome-extension://abcdefghijklmnop/")
//!     .with_manifest_dir("/opt/cdb/manifests");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Name chrome-discord-bridge is installed under.
pub const DEFAULT_HOST_NAME: &str = "io.github.p00ya.cdb";

// ============================================================================
// BridgeOptions
// ============================================================================

/// Native-messaging host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Host name; the manifest is `<host_name>.json`.
    pub host_name: String,

    /// Directories searched for the manifest, in order.
    ///
    /// Empty means the platform's browser defaults.
    pub manifest_dirs: Vec<PathBuf>,

    /// Bridge executable; bypasses manifest lookup when set.
    pub program: Option<PathBuf>,

    /// Caller origin passed as the first argument, as browsers do.
    pub origin: Option<String>,

    /// Additional arguments after the origin.
    pub extra_args: Vec<String>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BridgeOptions {
    /// Creates options for the default chrome-discord-bridge host.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            host_name: DEFAULT_HOST_NAME.to_string(),
            manifest_dirs: Vec::new(),
            program: None,
            origin: None,
            extra_args: Vec::new(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeOptions {
    /// Sets the host name.
    #[inline]
    #[must_use]
    pub fn with_host_name(mut self, name: impl Into<String>) -> Self {
        self.host_name = name.into();
        self
    }

    /// Adds a directory to search for the host manifest.
    #[inline]
    #[must_use]
    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dirs.push(dir.into());
        self
    }

    /// Launches `program` directly instead of reading a manifest.
    #[inline]
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Sets the origin argument.
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Adds a custom argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

// ============================================================================
// Conversion
// ============================================================================

impl BridgeOptions {
    /// Converts options to bridge command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        self.origin
            .iter()
            .chain(self.extra_args.iter())
            .cloned()
            .collect()
    }

    /// Returns the manifest search path.
    #[must_use]
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        if self.manifest_dirs.is_empty() {
            default_manifest_dirs()
        } else {
            self.manifest_dirs.clone()
        }
    }

    /// Checks the host name against the browsers' naming rules.
    ///
    /// Lowercase alphanumerics, `_` and `.`; no leading, trailing or
    /// doubled dots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the name is invalid.
    pub fn validate(&self) -> Result<()> {
        let name = &self.host_name;
        let chars_ok = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.');

        if name.is_empty()
            || !chars_ok
            || name.starts_with('.')
            || name.ends_with('.')
            || name.contains("..")
        {
            return Err(Error::config(format!(
                "Invalid native messaging host name: {name:?}"
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Platform Defaults
// ============================================================================

/// Per-user then system-wide host directories of Chrome, Chromium and
/// Firefox.
#[cfg(target_os = "macos")]
fn default_manifest_dirs() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(config) = dirs::config_dir() {
        paths.push(config.join("Google/Chrome/NativeMessagingHosts"));
        paths.push(config.join("Chromium/NativeMessagingHosts"));
        paths.push(config.join("Mozilla/NativeMessagingHosts"));
    }
    paths.push(PathBuf::from("/Library/Google/Chrome/NativeMessagingHosts"));
    paths.push(PathBuf::from(
        "/Library/Application Support/Chromium/NativeMessagingHosts",
    ));
    paths.push(PathBuf::from(
        "/Library/Application Support/Mozilla/NativeMessagingHosts",
    ));
    paths
}

/// Per-user then system-wide host directories of Chrome, Chromium and
/// Firefox.
#[cfg(not(target_os = "macos"))]
fn default_manifest_dirs() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(config) = dirs::config_dir() {
        paths.push(config.join("google-chrome/NativeMessagingHosts"));
        paths.push(config.join("chromium/NativeMessagingHosts"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".mozilla/native-messaging-hosts"));
    }
    paths.push(PathBuf::from("/etc/opt/chrome/native-messaging-hosts"));
    paths.push(PathBuf::from("/etc/chromium/native-messaging-hosts"));
    paths.push(PathBuf::from("/usr/lib/mozilla/native-messaging-hosts"));
    paths
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_host() {
        let options = BridgeOptions::new();
        assert_eq!(options.host_name, DEFAULT_HOST_NAME);
        assert!(options.program.is_none());
        assert!(options.to_args().is_empty());
        assert_eq!(options, BridgeOptions::default());
    }

    #[test]
    fn test_args_put_origin_first() {
        let options = BridgeOptions::new()
            .with_arg("--verbose")
            .with_origin("chrome-extension://abc/");
        assert_eq!(options.to_args(), vec!["chrome-extension://abc/", "--verbose"]);
    }

    #[test]
    fn test_explicit_dirs_replace_defaults() {
        let options = BridgeOptions::new().with_manifest_dir("/tmp/hosts");
        assert_eq!(options.search_dirs(), vec![PathBuf::from("/tmp/hosts")]);
    }

    #[test]
    fn test_validate_host_name() {
        assert!(BridgeOptions::new().validate().is_ok());
        assert!(BridgeOptions::new().with_host_name("com.example_host").validate().is_ok());

        for bad in ["", "Io.github", ".leading", "trailing.", "dou..ble", "has space", "a/b"] {
            let err = BridgeOptions::new().with_host_name(bad).validate();
            assert!(err.is_err(), "{bad:?} should be rejected");
        }
    }
}
