//! Client and factory seams used by the activity manager.
//!
//! [`Connection`](crate::transport::Connection) is the production
//! [`ActivityClient`]; tests substitute in-memory fakes through
//! [`ClientFactory`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::ClientId;
use crate::protocol::Response;

// ============================================================================
// ActivityClient
// ============================================================================

/// One connection to the chat client, bound to a single [`ClientId`].
///
/// Starts connected. Once disconnected it stays disconnected.
#[async_trait]
pub trait ActivityClient: Send + Sync {
    /// Identity announced in the handshake.
    fn client_id(&self) -> &ClientId;

    /// Returns `true` until the connection is torn down.
    fn is_connected(&self) -> bool;

    /// Sends the handshake and waits for its reply.
    async fn send_handshake(&self) -> Result<Response>;

    /// Sends a set-activity command and waits for its reply.
    async fn send_activity(&self, state: &str) -> Result<Response>;

    /// Tears the connection down. Idempotent.
    fn disconnect(&self);
}

// ============================================================================
// ClientFactory
// ============================================================================

/// Opens connections on behalf of the manager.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Opens a new connection for `client_id`.
    async fn connect(&self, client_id: &ClientId) -> Result<Arc<dyn ActivityClient>>;
}

#[async_trait]
impl<T: ClientFactory + ?Sized> ClientFactory for Arc<T> {
    async fn connect(&self, client_id: &ClientId) -> Result<Arc<dyn ActivityClient>> {
        (**self).connect(client_id).await
    }
}
