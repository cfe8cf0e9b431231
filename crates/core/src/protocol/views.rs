//! Read-only snapshots carried inside notifications

use serde::{Deserialize, Serialize};

use crate::models::{ConnectionId, GameKind, Mark, MemberView, Phase, Settings};

/// Disk or piece count per mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub o: usize,
    pub x: usize,
}

/// Board as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub size: usize,
    /// Row-major cells
    pub cells: Vec<Option<Mark>>,
    pub turn: Mark,
    pub last_move: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    /// Legal targets for the side to move (Othello)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legal_moves: Vec<usize>,
    /// Pieces removed on their owner's next placement (limit mode)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fading: Vec<usize>,
}

/// One playing position
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub occupant: Option<ConnectionId>,
    pub color: Option<String>,
}

/// Full lobby state broadcast whenever membership, readiness or slots change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshot {
    pub code: String,
    pub game_kind: GameKind,
    pub settings: Settings,
    pub phase: Phase,
    pub host: ConnectionId,
    /// In join order
    pub members: Vec<MemberView>,
    pub slot_o: SlotView,
    pub slot_x: SlotView,
}

/// The two seated players when a match starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seats {
    pub o: MemberView,
    pub x: MemberView,
}

/// Public room list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub code: String,
    pub game_kind: GameKind,
    pub members: usize,
    pub max_members: usize,
    pub phase: Phase,
    pub host_name: String,
}

/// One page of public rooms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListPage {
    pub rooms: Vec<RoomSummary>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rooms: usize,
}
