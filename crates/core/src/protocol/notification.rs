//! Outbound notifications and their addressing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{ConnectionId, EndReason, GameKind, Mark, MatchResult, MemberView, Settings};

use super::views::{BoardView, LobbySnapshot, RoomListPage, Seats};

/// Everything the server tells clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notification {
    RoomCreated {
        code: String,
        you: ConnectionId,
        lobby: LobbySnapshot,
    },
    RoomJoined {
        code: String,
        you: ConnectionId,
        lobby: LobbySnapshot,
    },
    LobbySnapshot {
        lobby: LobbySnapshot,
    },
    SettingsChanged {
        game_kind: GameKind,
        settings: Settings,
    },
    RoomList {
        page: RoomListPage,
    },
    SlotTaken {
        mark: Mark,
        member: MemberView,
    },
    SlotLeft {
        mark: Mark,
        member_id: ConnectionId,
    },
    ChatMessage {
        from: ConnectionId,
        name: String,
        text: String,
        sent_at: DateTime<Utc>,
    },
    MatchStarting {
        game_kind: GameKind,
        /// The recipient's own mark; `None` for spectators
        mark: Option<Mark>,
        seats: Seats,
        board: BoardView,
    },
    BoardUpdated {
        board: BoardView,
    },
    PassTurn {
        passed: Mark,
        next: Mark,
    },
    GameOver {
        result: MatchResult,
        reason: EndReason,
        board: BoardView,
    },
    OpponentDisconnected {
        member_id: ConnectionId,
        name: String,
    },
    HostChanged {
        host: ConnectionId,
    },
    Kicked {
        code: String,
        /// Only removed from a slot, still in the room
        from_slot: bool,
    },
    RoomClosed {
        code: String,
    },
    Error {
        code: String,
        message: String,
    },
}

impl Notification {
    pub fn error(err: &Error) -> Self {
        Notification::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Who receives a notification, relative to the caller of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Caller,
    /// A single connection, which need not be a room member any more
    Member(ConnectionId),
    /// Every room member except the caller
    Others,
    /// Every room member
    All,
}

/// A notification together with its audience
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub audience: Audience,
    pub notification: Notification,
}

impl Outbound {
    pub fn caller(notification: Notification) -> Self {
        Self {
            audience: Audience::Caller,
            notification,
        }
    }

    pub fn member(id: ConnectionId, notification: Notification) -> Self {
        Self {
            audience: Audience::Member(id),
            notification,
        }
    }

    pub fn others(notification: Notification) -> Self {
        Self {
            audience: Audience::Others,
            notification,
        }
    }

    pub fn all(notification: Notification) -> Self {
        Self {
            audience: Audience::All,
            notification,
        }
    }
}
