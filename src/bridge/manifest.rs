//! Native-messaging host manifest lookup.
//!
//! Browsers resolve a host name to `<name>.json` in a set of well-known
//! directories; the manifest names the executable to spawn.
//!
//! # Format
//!
//! ```json
//! {
//!   "name": "io.github.p00ya.cdb",
//!   "description": "Chrome Discord Bridge",
//!   "path": "/usr/local/bin/chrome-discord-bridge",
//!   "type": "stdio",
//!   "allowed_origins": ["chrome-extension://.../"]
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::options::BridgeOptions;

// ============================================================================
// HostManifest
// ============================================================================

/// A parsed native-messaging host manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostManifest {
    /// Host name; must match the file name.
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Bridge executable. Relative paths are relative to the manifest.
    pub path: PathBuf,

    /// Transport type; only `stdio` exists.
    #[serde(rename = "type")]
    pub host_type: String,

    /// Chrome extension origins allowed to connect.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_origins: Vec<String>,

    /// Firefox extension IDs allowed to connect.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_extensions: Vec<String>,
}

impl HostManifest {
    /// Reads and validates a manifest file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::Manifest`] if it does not parse, the name differs from
    ///   `expected_name`, or the type is not `stdio`
    pub fn load(manifest_path: &Path, expected_name: &str) -> Result<Self> {
        let text = fs::read_to_string(manifest_path)?;
        let mut manifest: Self = serde_json::from_str(&text)
            .map_err(|e| Error::manifest(manifest_path, e.to_string()))?;

        if manifest.name != expected_name {
            return Err(Error::manifest(
                manifest_path,
                format!("name {:?} does not match {expected_name:?}", manifest.name),
            ));
        }

        if manifest.host_type != "stdio" {
            return Err(Error::manifest(
                manifest_path,
                format!("unsupported type {:?}", manifest.host_type),
            ));
        }

        if manifest.path.as_os_str().is_empty() {
            return Err(Error::manifest(manifest_path, "empty path"));
        }

        if manifest.path.is_relative()
            && let Some(dir) = manifest_path.parent()
        {
            manifest.path = dir.join(&manifest.path);
        }

        Ok(manifest)
    }

    /// Finds the manifest for the configured host.
    ///
    /// The first directory containing `<host_name>.json` wins.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the host name is invalid
    /// - [`Error::HostNotFound`] if no directory has the manifest
    /// - errors from [`HostManifest::load`] for the first match
    pub fn locate(options: &BridgeOptions) -> Result<Self> {
        options.validate()?;

        let file_name = format!("{}.json", options.host_name);
        for dir in options.search_dirs() {
            let candidate = dir.join(&file_name);
            if !candidate.is_file() {
                trace!(path = %candidate.display(), "No manifest");
                continue;
            }

            debug!(path = %candidate.display(), "Found host manifest");
            return Self::load(&candidate, &options.host_name);
        }

        Err(Error::host_not_found(&options.host_name))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tempfile::TempDir;

    use crate::bridge::options::DEFAULT_HOST_NAME;

    fn write_manifest(dir: &Path, name: &str, manifest: &serde_json::Value) {
        let path = dir.join(format!("{name}.json"));
        fs::write(path, manifest.to_string()).expect("write manifest");
    }

    #[test]
    fn test_locate_first_match_wins() {
        let first = TempDir::new().expect("tempdir");
        let second = TempDir::new().expect("tempdir");
        write_manifest(
            second.path(),
            DEFAULT_HOST_NAME,
            &json!({"name": DEFAULT_HOST_NAME, "path": "/bin/cdb", "type": "stdio"}),
        );

        let options = BridgeOptions::new()
            .with_manifest_dir(first.path())
            .with_manifest_dir(second.path());

        let manifest = HostManifest::locate(&options).expect("locate");
        assert_eq!(manifest.path, PathBuf::from("/bin/cdb"));
        assert!(manifest.allowed_origins.is_empty());
    }

    #[test]
    fn test_locate_missing_host() {
        let dir = TempDir::new().expect("tempdir");
        let options = BridgeOptions::new().with_manifest_dir(dir.path());

        let err = HostManifest::locate(&options).unwrap_err();
        assert!(matches!(err, Error::HostNotFound { ref name } if name == DEFAULT_HOST_NAME));
        assert!(err.is_installation_error());
    }

    #[test]
    fn test_relative_path_resolves_against_manifest_dir() {
        let dir = TempDir::new().expect("tempdir");
        write_manifest(
            dir.path(),
            "com.example.host",
            &json!({"name": "com.example.host", "path": "bin/host", "type": "stdio"}),
        );

        let options = BridgeOptions::new()
            .with_host_name("com.example.host")
            .with_manifest_dir(dir.path());

        let manifest = HostManifest::locate(&options).expect("locate");
        assert_eq!(manifest.path, dir.path().join("bin/host"));
    }

    #[test]
    fn test_load_rejects_name_mismatch() {
        let dir = TempDir::new().expect("tempdir");
        write_manifest(
            dir.path(),
            DEFAULT_HOST_NAME,
            &json!({"name": "other.host", "path": "/bin/cdb", "type": "stdio"}),
        );

        let options = BridgeOptions::new().with_manifest_dir(dir.path());
        let err = HostManifest::locate(&options).unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
    }

    #[test]
    fn test_load_rejects_non_stdio() {
        let dir = TempDir::new().expect("tempdir");
        write_manifest(
            dir.path(),
            DEFAULT_HOST_NAME,
            &json!({"name": DEFAULT_HOST_NAME, "path": "/bin/cdb", "type": "socket"}),
        );

        let options = BridgeOptions::new().with_manifest_dir(dir.path());
        let err = HostManifest::locate(&options).unwrap_err();
        assert!(err.to_string().contains("unsupported type"));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(format!("{DEFAULT_HOST_NAME}.json"));
        fs::write(&path, "{not json").expect("write");

        let err = HostManifest::load(&path, DEFAULT_HOST_NAME).unwrap_err();
        assert!(matches!(err, Error::Manifest { .. }));
    }
}
