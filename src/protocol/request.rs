//! Request and Response frame types.
//!
//! Discord-IPC payloads as relayed by chrome-discord-bridge. Only the two
//! requests the crate sends are modelled; responses keep everything the
//! manager inspects and ignore the rest.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::identifiers::{ClientId, Nonce};

// ============================================================================
// Command Tags
// ============================================================================

/// Command tag of the reply to a successful handshake.
pub const DISPATCH: &str = "DISPATCH";

/// Command tag of a set-activity request and its reply.
pub const SET_ACTIVITY: &str = "SET_ACTIVITY";

/// Discord-IPC protocol version sent in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

// ============================================================================
// Handshake
// ============================================================================

/// Handshake payload establishing the client identity.
///
/// # Format
///
/// ```json
/// { "client_id": "123456", "nonce": "", "v": 1 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handshake {
    /// Discord application ID.
    pub client_id: ClientId,

    /// Always empty; Discord answers with a `null` nonce regardless.
    pub nonce: String,

    /// Protocol version.
    pub v: u32,
}

impl Handshake {
    /// Creates a handshake for the given client.
    #[inline]
    #[must_use]
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            nonce: String::new(),
            v: PROTOCOL_VERSION,
        }
    }
}

// ============================================================================
// ActivityFrame
// ============================================================================

/// `SET_ACTIVITY` command payload.
///
/// # Format
///
/// ```json
/// {
///   "args": { "activity": { "state": "..." }, "pid": 0 },
///   "cmd": "SET_ACTIVITY",
///   "nonce": "uuid"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityFrame {
    /// Command arguments.
    pub args: ActivityArgs,

    /// Command tag, always [`SET_ACTIVITY`].
    pub cmd: &'static str,

    /// Correlation token echoed by the reply.
    pub nonce: Nonce,
}

/// Arguments of a `SET_ACTIVITY` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityArgs {
    /// The activity to publish.
    pub activity: Activity,

    /// Not our PID, but Discord rejects the command without one.
    pub pid: u32,
}

/// Rich Presence activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// User-visible status string.
    pub state: String,
}

impl ActivityFrame {
    /// Creates a set-activity frame with a fresh nonce.
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        Self::with_nonce(Nonce::generate(), state)
    }

    /// Creates a set-activity frame with a specific nonce.
    #[must_use]
    pub fn with_nonce(nonce: Nonce, state: impl Into<String>) -> Self {
        Self {
            args: ActivityArgs {
                activity: Activity {
                    state: state.into(),
                },
                pid: 0,
            },
            cmd: SET_ACTIVITY,
            nonce,
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// Any frame sent from the extension side to the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Request {
    /// Identity handshake.
    Handshake(Handshake),
    /// Activity update.
    SetActivity(ActivityFrame),
}

impl Request {
    /// Returns the key the reply to this request will be correlated by.
    #[must_use]
    pub fn reply_nonce(&self) -> Nonce {
        match self {
            Self::Handshake(_) => Nonce::handshake(),
            Self::SetActivity(frame) => frame.nonce.clone(),
        }
    }

    /// Returns a short label for logging.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Handshake(_) => "handshake",
            Self::SetActivity(_) => SET_ACTIVITY,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A frame received from the bridge.
///
/// # Format
///
/// ```json
/// { "cmd": "SET_ACTIVITY", "nonce": "uuid", "data": { "state": "..." } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Command tag.
    #[serde(default)]
    pub cmd: String,

    /// Correlation token; `Some(Value::Null)` for the handshake reply,
    /// `None` when the field is absent.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub nonce: Option<Value>,

    /// Event name, present on `DISPATCH` frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evt: Option<String>,

    /// Command-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Response {
    /// Returns the correlation key of this response.
    ///
    /// `None` if the frame carries no nonce at all; such a frame answers
    /// nothing.
    #[inline]
    #[must_use]
    pub fn reply_nonce(&self) -> Option<Nonce> {
        self.nonce.as_ref().map(Nonce::from_wire)
    }

    /// Returns `true` if the command tag equals `cmd`.
    #[inline]
    #[must_use]
    pub fn is_command(&self, cmd: &str) -> bool {
        self.cmd == cmd
    }

    /// Returns the echoed `data.state`, if present.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|v| v.get("state"))
            .and_then(|v| v.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_handshake_serialization() {
        let frame = Request::Handshake(Handshake::new(ClientId::new("TestClient")));
        let value = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(value, json!({"client_id": "TestClient", "nonce": "", "v": 1}));
    }

    #[test]
    fn test_activity_frame_serialization() {
        let nonce = Nonce::generate();
        let frame = Request::SetActivity(ActivityFrame::with_nonce(nonce.clone(), "Typing"));
        let value = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(
            value,
            json!({
                "args": {"activity": {"state": "Typing"}, "pid": 0},
                "cmd": "SET_ACTIVITY",
                "nonce": nonce.as_str(),
            })
        );
    }

    #[test]
    fn test_reply_nonce_for_handshake_is_sentinel() {
        let frame = Request::Handshake(Handshake::new(ClientId::new("x")));
        assert_eq!(frame.reply_nonce().as_str(), Nonce::HANDSHAKE);
    }

    #[test]
    fn test_dispatch_response() {
        let response: Response = serde_json::from_value(json!({
            "cmd": "DISPATCH",
            "evt": "READY",
            "nonce": null,
            "data": {"v": 1},
        }))
        .expect("parse");

        assert!(response.is_command(DISPATCH));
        assert_eq!(response.reply_nonce(), Some(Nonce::handshake()));
        assert_eq!(response.evt.as_deref(), Some("READY"));
        assert_eq!(response.state(), None);
    }

    #[test]
    fn test_set_activity_response() {
        let response: Response = serde_json::from_value(json!({
            "cmd": "SET_ACTIVITY",
            "nonce": "abc",
            "data": {"state": "Reviewing", "name": "WaniKani"},
        }))
        .expect("parse");

        assert!(response.is_command(SET_ACTIVITY));
        assert_eq!(response.reply_nonce(), Some(Nonce::from_wire(&json!("abc"))));
        assert_eq!(response.state(), Some("Reviewing"));
    }

    #[test]
    fn test_response_missing_fields_default() {
        let response: Response = serde_json::from_value(json!({})).expect("parse");
        assert_eq!(response.cmd, "");
        assert_eq!(response.reply_nonce(), None);
    }

    #[test]
    fn test_missing_nonce_differs_from_null() {
        let absent: Response =
            serde_json::from_value(json!({"cmd": "GARBAGE"})).expect("parse");
        let null: Response =
            serde_json::from_value(json!({"cmd": "DISPATCH", "nonce": null})).expect("parse");

        assert_eq!(absent.nonce, None);
        assert_eq!(null.nonce, Some(Value::Null));
        assert_ne!(absent.reply_nonce(), null.reply_nonce());
    }
}
