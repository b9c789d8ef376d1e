//! Native-messaging connection and event loop.
//!
//! This module handles the channel to chrome-discord-bridge, including
//! request/response correlation and disconnect handling.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming frames from the bridge (via a dedicated reader task)
//! - Outgoing requests from the Rust API
//! - Request/response correlation by nonce
//! - Rejecting every pending request once the channel closes, whichever
//!   side closed it

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::from_slice;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::activity::ActivityClient;
use crate::error::{Error, Result};
use crate::identifiers::{ClientId, Nonce};
use crate::protocol::codec::{read_frame, write_json};
use crate::protocol::{ActivityFrame, Handshake, Request, Response};

use super::process::ProcessGuard;

// ============================================================================
// Constants
// ============================================================================

/// Rejection reason when the bridge closes the channel.
const HOST_DISCONNECTED: &str = "host disconnected";

/// Rejection reason after [`Connection::disconnect`].
const CLIENT_DISCONNECTED: &str = "disconnected by client";

/// Time the bridge gets to close its Discord socket after stdin closes.
pub const EXIT_GRACE: Duration = Duration::from_secs(1);

// ============================================================================
// Types
// ============================================================================

/// Map of nonces to response channels.
type CorrelationMap = FxHashMap<Nonce, oneshot::Sender<Result<Response>>>;

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send a request and wait for response.
    Send {
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
    },
    /// Close the channel.
    Shutdown,
}

/// Output of the reader task.
enum Inbound {
    /// One raw frame body.
    Frame(Vec<u8>),
    /// The stream ended or failed; carries the reason.
    Closed(String),
}

// ============================================================================
// Connection
// ============================================================================

/// Native-messaging connection to chrome-discord-bridge.
///
/// Bound to one [`ClientId`] for its whole life. Starts connected;
/// disconnection is terminal and a new `Connection` is needed to reconnect.
pub struct Connection {
    /// Identity announced in the handshake.
    client_id: ClientId,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Cleared by `disconnect` and by the event loop on exit.
    connected: Arc<AtomicBool>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("client_id", &self.client_id)
            .field("connected", &self.is_connected())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a connection over an already open byte stream.
    ///
    /// `reader` carries frames from the bridge, `writer` carries frames to
    /// it. Spawns the event loop, so this must be called inside a tokio
    /// runtime.
    pub fn new<R, W>(client_id: ClientId, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::spawn(client_id, reader, writer, None)
    }

    /// Creates a connection that owns the bridge process.
    ///
    /// When the connection ends the process gets [`EXIT_GRACE`] to exit
    /// after its stdin closes, then is killed.
    pub(crate) fn spawn<R, W>(
        client_id: ClientId,
        reader: R,
        writer: W,
        process: Option<ProcessGuard>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let connected = Arc::new(AtomicBool::new(true));

        let reader_task = tokio::spawn(Self::run_reader(reader, inbound_tx));

        tokio::spawn(Self::run_event_loop(
            writer,
            command_rx,
            inbound_rx,
            reader_task,
            Arc::clone(&correlation),
            Arc::clone(&connected),
            process,
        ));

        debug!(client_id = %client_id, "Connection opened");

        Self {
            client_id,
            command_tx,
            correlation,
            connected,
        }
    }

    /// Returns the identity this connection was opened for.
    #[inline]
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Returns `true` until the connection is torn down.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Returns the number of requests waiting for a response.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Sends the Discord-IPC handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is already torn down
    /// - [`Error::Disconnected`] if it dies before the reply arrives
    pub async fn send_handshake(&self) -> Result<Response> {
        let handshake = Handshake::new(self.client_id.clone());
        self.send(Request::Handshake(handshake)).await
    }

    /// Sends a `SET_ACTIVITY` command with a fresh nonce.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is already torn down
    /// - [`Error::Disconnected`] if it dies before the reply arrives
    pub async fn send_activity(&self, state: &str) -> Result<Response> {
        self.send(Request::SetActivity(ActivityFrame::new(state)))
            .await
    }

    /// Disconnects from the bridge.
    ///
    /// Idempotent. Further requests fail with [`Error::NotConnected`];
    /// requests already in flight are rejected by the event loop.
    pub fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }

        debug!(client_id = %self.client_id, "Disconnect");
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Sends a request and waits for its correlated response.
    ///
    /// No timeout: a request whose reply never arrives waits until the
    /// connection dies.
    async fn send(&self, request: Request) -> Result<Response> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| Error::NotConnected)?;

        match response_rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::disconnected(HOST_DISCONNECTED)),
        }
    }

    /// Forwards raw frames from the bridge until the stream ends.
    async fn run_reader<R>(mut reader: R, inbound_tx: mpsc::UnboundedSender<Inbound>)
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let inbound = match read_frame(&mut reader).await {
                Ok(Some(body)) => Inbound::Frame(body),
                Ok(None) => Inbound::Closed(HOST_DISCONNECTED.to_string()),
                Err(e) => Inbound::Closed(format!("{HOST_DISCONNECTED}: {e}")),
            };

            let closed = matches!(inbound, Inbound::Closed(_));
            if inbound_tx.send(inbound).is_err() || closed {
                break;
            }
        }
    }

    /// Event loop that handles the channel I/O.
    async fn run_event_loop<W>(
        mut writer: W,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        mut inbound_rx: mpsc::UnboundedReceiver<Inbound>,
        reader_task: JoinHandle<()>,
        correlation: Arc<Mutex<CorrelationMap>>,
        connected: Arc<AtomicBool>,
        mut process: Option<ProcessGuard>,
    ) where
        W: AsyncWrite + Unpin,
    {
        let reason = loop {
            tokio::select! {
                // Incoming frames from the bridge
                inbound = inbound_rx.recv() => {
                    match inbound {
                        Some(Inbound::Frame(body)) => {
                            Self::handle_incoming_message(&body, &correlation);
                        }

                        Some(Inbound::Closed(reason)) => {
                            debug!(reason = %reason, "Channel closed by bridge");
                            break reason;
                        }

                        None => break HOST_DISCONNECTED.to_string(),
                    }
                }

                // Commands from Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request, response_tx }) => {
                            if let Err(reason) = Self::handle_send_command(
                                request,
                                response_tx,
                                &mut writer,
                                &correlation,
                            ).await {
                                break reason;
                            }
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = writer.shutdown().await;
                            break CLIENT_DISCONNECTED.to_string();
                        }

                        None => {
                            debug!("Command channel closed");
                            break CLIENT_DISCONNECTED.to_string();
                        }
                    }
                }
            }
        };

        connected.store(false, Ordering::Release);
        reader_task.abort();

        // Fail all pending requests, whichever side closed the channel
        Self::fail_pending_requests(&correlation, &reason);

        // Closing stdin is the bridge's signal to exit.
        drop(writer);

        if let Some(process) = process.as_mut() {
            process.shutdown(EXIT_GRACE).await;
        }

        debug!(reason = %reason, "Event loop terminated");
    }

    /// Handles an incoming frame from the bridge.
    fn handle_incoming_message(body: &[u8], correlation: &Arc<Mutex<CorrelationMap>>) {
        let response = match from_slice::<Response>(body) {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    error = %e,
                    text = %String::from_utf8_lossy(body),
                    "Failed to parse incoming message"
                );
                return;
            }
        };

        debug!(cmd = %response.cmd, nonce = ?response.nonce, "Received");

        let Some(nonce) = response.reply_nonce() else {
            warn!(cmd = %response.cmd, "Response without nonce");
            return;
        };
        let tx = correlation.lock().remove(&nonce);

        match tx {
            Some(tx) => {
                let _ = tx.send(Ok(response));
            }
            None => warn!(nonce = %nonce, "Unexpected response"),
        }
    }

    /// Handles a send command from the Rust API.
    ///
    /// Returns `Err` with a rejection reason if the channel is unusable.
    async fn handle_send_command<W>(
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
        writer: &mut W,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) -> std::result::Result<(), String>
    where
        W: AsyncWrite + Unpin,
    {
        let nonce = request.reply_nonce();

        // Store correlation before sending
        {
            let mut correlation = correlation.lock();
            if correlation.contains_key(&nonce) {
                let _ = response_tx.send(Err(Error::protocol(format!(
                    "Request with nonce {nonce} already pending"
                ))));
                return Ok(());
            }
            correlation.insert(nonce.clone(), response_tx);
        }

        trace!(kind = request.kind(), nonce = %nonce, "Send");

        if let Err(e) = write_json(writer, &request).await {
            warn!(error = %e, "Failed to write frame");
            return Err(format!("{HOST_DISCONNECTED}: {e}"));
        }

        Ok(())
    }

    /// Fails all pending requests with a disconnected error.
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>, reason: &str) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::disconnected(reason)));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on disconnect");
        }
    }
}

// ============================================================================
// ActivityClient
// ============================================================================

#[async_trait]
impl ActivityClient for Connection {
    fn client_id(&self) -> &ClientId {
        Connection::client_id(self)
    }

    fn is_connected(&self) -> bool {
        Connection::is_connected(self)
    }

    async fn send_handshake(&self) -> Result<Response> {
        Connection::send_handshake(self).await
    }

    async fn send_activity(&self, state: &str) -> Result<Response> {
        Connection::send_activity(self, state).await
    }

    fn disconnect(&self) {
        Connection::disconnect(self);
    }
}

// ============================================================================
// Tests
// ============================================================================
