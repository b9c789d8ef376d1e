//! Activity update serialization.
//!
//! [`ActivityManager`] sits between browser event handlers and the bridge
//! connection. Event handlers may fire in bursts (tab activated, tab
//! updated, content pushes); the manager runs at most one operation against
//! the connection at a time and, of the updates that queued up meanwhile,
//! only sends the most recent.
//!
//! # Scheduling
//!
//! The manager keeps a chain of links. Each `set_activity` call overwrites
//! the single queued intent, appends a link, and spawns a step that waits
//! for the previous link to settle (success or failure) before taking the
//! intent. A step that finds the intent already taken resolves without
//! doing any work.
//!
//! ```text
//! set("a") ─► link 1: take intent ─► connect/handshake/send "c" ─┐
//! set("b") ─► link 2: wait link 1 ─► intent empty ─► Ok ◄────────┘
//! set("c") ─► link 3: wait link 2 ─► intent empty ─► Ok
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::bridge::{BridgeOptions, NativeHostFactory};
use crate::error::Result;
use crate::identifiers::ClientId;
use crate::protocol::{DISPATCH, SET_ACTIVITY};

use super::client::{ActivityClient, ClientFactory};

// ============================================================================
// Types
// ============================================================================

/// Settles once a step and every step before it have settled.
type Link = Shared<BoxFuture<'static, ()>>;

/// The most recent update not yet picked up by a step.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueuedIntent {
    client_id: ClientId,
    activity: String,
}

/// Internal shared state for the manager.
struct ManagerInner {
    /// Opens connections.
    factory: Box<dyn ClientFactory>,

    /// Current connection, possibly already disconnected.
    client: Mutex<Option<Arc<dyn ActivityClient>>>,

    /// Last state confirmed by the chat client on the current connection.
    activity_state: Mutex<Option<String>>,

    /// At most one pending update; later calls overwrite it.
    next_activity: Mutex<Option<QueuedIntent>>,

    /// Tail of the chain.
    waiting: Mutex<Link>,
}

// ============================================================================
// ActivityManager
// ============================================================================

/// High-level handle for setting and clearing the published activity.
///
/// Cheap to clone; clones share the same connection and queue.
///
/// # Example
///
/// ```no_run
/// use browser_activity::ActivityManager;
///
/// # async fn example() -> browser_activity::Result<()> {
/// let manager = ActivityManager::new();
///
/// manager.set_activity("123456", "Reviewing kanji").await?;
/// manager.clear_activity();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ActivityManager {
    /// Shared inner state.
    inner: Arc<ManagerInner>,
}

impl fmt::Debug for ActivityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityManager")
            .field("client_id", &self.client_id())
            .field("connected", &self.is_connected())
            .field("activity_state", &self.activity_state())
            .finish_non_exhaustive()
    }
}

impl Default for ActivityManager {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ActivityManager - Constructors
// ============================================================================

impl ActivityManager {
    /// Creates a manager that launches chrome-discord-bridge on demand.
    ///
    /// No connection is opened until the first update.
    #[must_use]
    pub fn new() -> Self {
        Self::with_factory(NativeHostFactory::default())
    }

    /// Creates a manager launching the bridge with custom options.
    #[must_use]
    pub fn with_options(options: BridgeOptions) -> Self {
        Self::with_factory(NativeHostFactory::new(options))
    }

    /// Creates a manager that opens connections through `factory`.
    #[must_use]
    pub fn with_factory(factory: impl ClientFactory + 'static) -> Self {
        let settled: Link = future::ready(()).boxed().shared();

        Self {
            inner: Arc::new(ManagerInner {
                factory: Box::new(factory),
                client: Mutex::new(None),
                activity_state: Mutex::new(None),
                next_activity: Mutex::new(None),
                waiting: Mutex::new(settled),
            }),
        }
    }
}

// ============================================================================
// ActivityManager - Public API
// ============================================================================

impl ActivityManager {
    /// Schedules an update to the activity.
    ///
    /// If an operation is outstanding nothing is sent yet; when it finishes
    /// only the parameters of the latest call are used. The returned future
    /// settles when this call's turn in the queue has run: with the outcome
    /// of the send if this call's step picked up the queued update, or
    /// `Ok(())` if an earlier step already sent a newer one.
    ///
    /// The update runs whether or not the returned future is awaited. Must
    /// be called within a tokio runtime.
    pub fn set_activity(
        &self,
        client_id: impl Into<ClientId>,
        activity: impl Into<String>,
    ) -> ActivityUpdate {
        let intent = QueuedIntent {
            client_id: client_id.into(),
            activity: activity.into(),
        };
        trace!(client_id = %intent.client_id, activity = %intent.activity, "Queued activity");
        *self.inner.next_activity.lock() = Some(intent);

        let (settled_tx, settled_rx) = oneshot::channel::<()>();
        let link: Link = settled_rx.map(|_| ()).boxed().shared();
        let outstanding = mem::replace(&mut *self.inner.waiting.lock(), link);

        let (result_tx, result_rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            // The previous step's outcome belongs to its own caller.
            outstanding.await;

            let next = inner.next_activity.lock().take();
            let result = match next {
                Some(intent) => inner.maybe_connect_and_send(intent).await,
                None => {
                    trace!("Update superseded");
                    Ok(())
                }
            };

            let _ = settled_tx.send(());
            if let Err(Err(e)) = result_tx.send(result) {
                debug!(error = %e, "Activity update failed with no listener");
            }
        });

        ActivityUpdate { result_rx }
    }

    /// Clears the activity by disconnecting.
    ///
    /// Drops any queued update and forgets the confirmed state. Does not
    /// wait for an in-flight operation. Idempotent.
    pub fn clear_activity(&self) {
        self.inner.next_activity.lock().take();
        self.inner.activity_state.lock().take();

        let client = self.inner.client.lock().clone();
        if let Some(client) = client {
            client.disconnect();
        }
    }

    /// Returns the last activity state confirmed by the chat client.
    ///
    /// `None` whenever there is no live connection.
    #[must_use]
    pub fn activity_state(&self) -> Option<String> {
        if !self.is_connected() {
            return None;
        }
        self.inner.activity_state.lock().clone()
    }

    /// Returns `true` if a live connection exists.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner
            .client
            .lock()
            .as_ref()
            .is_some_and(|client| client.is_connected())
    }

    /// Returns the client ID of the live connection, if any.
    #[must_use]
    pub fn client_id(&self) -> Option<ClientId> {
        self.inner
            .client
            .lock()
            .as_ref()
            .filter(|client| client.is_connected())
            .map(|client| client.client_id().clone())
    }
}

// ============================================================================
// ManagerInner - Operations
// ============================================================================

impl ManagerInner {
    /// Makes sure a connection for `client_id` exists, then sends the
    /// activity unless it is already set.
    async fn maybe_connect_and_send(&self, intent: QueuedIntent) -> Result<()> {
        let QueuedIntent {
            client_id,
            activity,
        } = intent;

        let current = self.client.lock().clone();
        let client = match current {
            Some(client) if client.is_connected() && *client.client_id() == client_id => client,
            current => {
                // The client ID is fixed by the handshake.
                if let Some(stale) = current.filter(|client| client.is_connected()) {
                    debug!(
                        from = %stale.client_id(),
                        to = %client_id,
                        "Client ID changed, reconnecting"
                    );
                    self.activity_state.lock().take();
                    stale.disconnect();
                }
                self.connect(&client_id).await?
            }
        };

        if self.activity_state.lock().as_deref() == Some(activity.as_str()) {
            trace!(activity = %activity, "Activity already set");
            return Ok(());
        }

        let response = match client.send_activity(&activity).await {
            Ok(response) => response,
            Err(e) => {
                if !client.is_connected() {
                    self.activity_state.lock().take();
                }
                return Err(e);
            }
        };
        if !response.is_command(SET_ACTIVITY) {
            debug!(
                got = %response.cmd,
                wanted = SET_ACTIVITY,
                "Unexpected response"
            );
            return Ok(());
        }

        // A clear_activity() that raced the send wins.
        if client.is_connected() {
            *self.activity_state.lock() = response.state().map(str::to_owned);
        }

        Ok(())
    }

    /// Opens a connection and performs the handshake.
    async fn connect(&self, client_id: &ClientId) -> Result<Arc<dyn ActivityClient>> {
        let client = self.factory.connect(client_id).await?;

        // Installed before the handshake so clear_activity() can reach it.
        self.activity_state.lock().take();
        *self.client.lock() = Some(Arc::clone(&client));

        let response = match client.send_handshake().await {
            Ok(response) => response,
            Err(e) => {
                client.disconnect();
                return Err(e);
            }
        };

        if !response.is_command(DISPATCH) {
            debug!(got = %response.cmd, wanted = DISPATCH, "Unexpected response");
        }

        debug!(client_id = %client_id, "Connected");
        Ok(client)
    }
}

// ============================================================================
// ActivityUpdate
// ============================================================================

/// Outcome of a [`ActivityManager::set_activity`] call.
///
/// Dropping it does not cancel the update.
#[derive(Debug)]
pub struct ActivityUpdate {
    result_rx: oneshot::Receiver<Result<()>>,
}

impl Future for ActivityUpdate {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.result_rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|e| Err(e.into())))
    }
}

// ============================================================================
// Tests
// ============================================================================
