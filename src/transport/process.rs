//! Bridge process ownership.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, info};

// ============================================================================
// ProcessGuard
// ============================================================================

/// Guards the bridge child process and ensures it is killed when dropped.
///
/// Owned by the connection's event loop, so the process lives exactly as
/// long as the connection.
#[derive(Debug)]
pub struct ProcessGuard {
    /// The child process handle.
    child: Option<Child>,
    /// Process ID for logging.
    pid: u32,
}

impl ProcessGuard {
    /// Creates a new process guard.
    #[must_use]
    pub fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        debug!(pid, "Process guard created");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Gives the process `grace` to exit on its own, then kills it.
    ///
    /// Returns `true` if it exited without being killed.
    pub async fn shutdown(&mut self, grace: Duration) -> bool {
        let Some(mut child) = self.child.take() else {
            return true;
        };

        match timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!(pid = self.pid, %status, "Bridge process exited");
                return true;
            }
            Ok(Err(e)) => debug!(pid = self.pid, error = %e, "Failed to wait for process"),
            Err(_) => debug!(pid = self.pid, "Bridge process did not exit in time"),
        }

        debug!(pid = self.pid, "Killing bridge process");
        if let Err(e) = child.kill().await {
            debug!(pid = self.pid, error = %e, "Failed to kill process");
        }
        info!(pid = self.pid, "Bridge process terminated");
        false
    }

    /// Kills the process immediately if it is still running and reaps it.
    pub async fn kill(&mut self) -> bool {
        self.shutdown(Duration::ZERO).await
    }

    /// Returns the process ID.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
