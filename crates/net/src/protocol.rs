//! Wire messages
//!
//! Every frame holds one JSON object with a `type` field. Clients send
//! intents plus `pong`; the server sends notifications plus `ping`.

use boardroom_core::{Intent, Notification};
use serde_json::{json, Value};

const PING: &str = "ping";
const PONG: &str = "pong";

/// What a client may send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// Answer to a liveness ping
    Pong,
    Intent(Intent),
}

impl ClientFrame {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            ClientFrame::Pong => serde_json::to_vec(&json!({ "type": PONG })),
            ClientFrame::Intent(intent) => serde_json::to_vec(intent),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        if value.get("type").and_then(Value::as_str) == Some(PONG) {
            return Ok(ClientFrame::Pong);
        }
        serde_json::from_value(value).map(ClientFrame::Intent)
    }
}

/// What the server sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// Liveness check
    Ping,
    Notification(Notification),
}

impl ServerFrame {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            ServerFrame::Ping => serde_json::to_vec(&json!({ "type": PING })),
            ServerFrame::Notification(notification) => serde_json::to_vec(notification),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        if value.get("type").and_then(Value::as_str) == Some(PING) {
            return Ok(ServerFrame::Ping);
        }
        serde_json::from_value(value).map(ServerFrame::Notification)
    }
}
