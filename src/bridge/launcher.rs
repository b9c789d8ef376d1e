//! Default connection factory: spawns chrome-discord-bridge.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::activity::{ActivityClient, ClientFactory};
use crate::error::{Error, Result};
use crate::identifiers::ClientId;
use crate::transport::{Connection, ProcessGuard};

use super::manifest::HostManifest;
use super::options::BridgeOptions;

// ============================================================================
// NativeHostFactory
// ============================================================================

/// Opens a [`Connection`] by launching the native-messaging host.
///
/// Every call spawns a fresh bridge process; the process lives exactly as
/// long as the returned connection.
#[derive(Debug, Clone, Default)]
pub struct NativeHostFactory {
    /// Host lookup and launch options.
    options: BridgeOptions,
}

impl NativeHostFactory {
    /// Creates a factory with the given options.
    #[inline]
    #[must_use]
    pub fn new(options: BridgeOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Resolves the executable to launch.
    ///
    /// # Errors
    ///
    /// Errors from [`HostManifest::locate`] when no program override is set.
    pub fn resolve_program(&self) -> Result<PathBuf> {
        match &self.options.program {
            Some(program) => Ok(program.clone()),
            None => HostManifest::locate(&self.options).map(|manifest| manifest.path),
        }
    }

    /// Spawns the bridge with piped stdio.
    fn spawn_bridge_process(&self, program: &Path) -> Result<Child> {
        let mut cmd = Command::new(program);
        cmd.args(self.options.to_args());

        // Frames travel over stdin/stdout; the bridge logs to stderr.
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        cmd.spawn().map_err(Error::process_launch_failed)
    }
}

#[async_trait]
impl ClientFactory for NativeHostFactory {
    async fn connect(&self, client_id: &ClientId) -> Result<Arc<dyn ActivityClient>> {
        let program = self.resolve_program()?;
        debug!(program = %program.display(), "Launching native messaging host");

        let mut child = self.spawn_bridge_process(&program)?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(Error::ProcessLaunchFailed {
                message: "bridge stdio not captured".to_string(),
            });
        };

        let process = ProcessGuard::new(child);
        info!(pid = process.pid(), client_id = %client_id, "Bridge process spawned");

        let connection = Connection::spawn(client_id.clone(), stdout, stdin, Some(process));
        Ok(Arc::new(connection))
    }
}

// ============================================================================
// Tests
// ============================================================================
