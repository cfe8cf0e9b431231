//! Inbound intents, already decoded from the wire

use serde::{Deserialize, Serialize};

use crate::models::{ConnectionId, GameKind, Mark, Settings};

/// Everything a client can ask of the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Intent {
    CreateRoom {
        name: String,
        #[serde(default)]
        game_kind: GameKind,
        #[serde(default)]
        settings: Option<Settings>,
    },
    JoinRoom {
        code: String,
        name: String,
    },
    LeaveRoom,
    UpdateSettings {
        settings: Settings,
    },
    ListPublicRooms {
        #[serde(default)]
        page: usize,
    },
    TakeSlot {
        mark: Mark,
    },
    LeaveSlot,
    UpdateSlotColor {
        color: String,
    },
    SendChat {
        text: String,
    },
    SetReady {
        ready: bool,
    },
    SubmitMove {
        cell: usize,
    },
    DeclareGameOver,
    Surrender,
    ReturnToLobby,
    ChangeGameKind {
        game_kind: GameKind,
    },
    KickMember {
        target: ConnectionId,
    },
}

impl Intent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::CreateRoom { .. } => "createRoom",
            Intent::JoinRoom { .. } => "joinRoom",
            Intent::LeaveRoom => "leaveRoom",
            Intent::UpdateSettings { .. } => "updateSettings",
            Intent::ListPublicRooms { .. } => "listPublicRooms",
            Intent::TakeSlot { .. } => "takeSlot",
            Intent::LeaveSlot => "leaveSlot",
            Intent::UpdateSlotColor { .. } => "updateSlotColor",
            Intent::SendChat { .. } => "sendChat",
            Intent::SetReady { .. } => "setReady",
            Intent::SubmitMove { .. } => "submitMove",
            Intent::DeclareGameOver => "declareGameOver",
            Intent::Surrender => "surrender",
            Intent::ReturnToLobby => "returnToLobby",
            Intent::ChangeGameKind { .. } => "changeGameKind",
            Intent::KickMember { .. } => "kickMember",
        }
    }
}
