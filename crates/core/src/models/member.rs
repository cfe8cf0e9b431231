//! Room members and their roles

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Mark;
use crate::config::MAX_CHAT_COOLDOWN_MS;

/// Stable identity the transport assigns to each connection
pub type ConnectionId = Uuid;

/// Longest display name kept after trimming
pub const MAX_NAME_LEN: usize = 24;

/// A member's role inside a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Seated in slot O
    O,
    /// Seated in slot X
    X,
    Spectator,
}

impl Role {
    pub fn seated(mark: Mark) -> Self {
        match mark {
            Mark::O => Role::O,
            Mark::X => Role::X,
        }
    }

    /// The slot this role occupies, if any
    pub fn mark(&self) -> Option<Mark> {
        match self {
            Role::O => Some(Mark::O),
            Role::X => Some(Mark::X),
            Role::Spectator => None,
        }
    }

    pub fn is_seated(&self) -> bool {
        self.mark().is_some()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::O => "Player O",
            Role::X => "Player X",
            Role::Spectator => "Spectator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A connection's membership record in a room
#[derive(Debug, Clone)]
pub struct Member {
    pub id: ConnectionId,
    pub name: String,
    pub role: Role,
    /// Ready for the match in Lobby, ready to go back in PostMatch
    pub ready: bool,
    /// Set by a kick; the member may not take a slot before this instant
    pub slot_exclusion_until: Option<DateTime<Utc>>,
    /// Join order, used to pick the next host
    pub joined_seq: u64,
    pub last_chat_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn new(id: ConnectionId, name: &str, joined_seq: u64) -> Self {
        Self {
            id,
            name: sanitize_name(name),
            role: Role::Spectator,
            ready: false,
            slot_exclusion_until: None,
            joined_seq,
            last_chat_at: None,
        }
    }

    pub fn standing(&self) -> Standing {
        Standing {
            slot_exclusion_until: self.slot_exclusion_until,
            last_chat_at: self.last_chat_at,
        }
    }

    /// Carry over clocks from an earlier stay in the same room
    pub fn restore(&mut self, standing: Standing) {
        self.slot_exclusion_until = standing.slot_exclusion_until;
        self.last_chat_at = standing.last_chat_at;
    }

    /// Whole seconds left on a kick exclusion, rounded up
    pub fn exclusion_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let until = self.slot_exclusion_until?;
        if until <= now {
            return None;
        }
        let millis = (until - now).num_milliseconds();
        Some((millis + 999) / 1000)
    }
}

/// Pacing state a room keeps for a connection after it leaves, so that
/// leaving and rejoining does not lift a kick exclusion or a chat cooldown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Standing {
    pub slot_exclusion_until: Option<DateTime<Utc>>,
    pub last_chat_at: Option<DateTime<Utc>>,
}

impl Standing {
    /// Whether either clock can still hold the connection back at `now`
    pub fn in_force(&self, now: DateTime<Utc>) -> bool {
        let excluded = self.slot_exclusion_until.is_some_and(|until| until > now);
        let chatted = self
            .last_chat_at
            .is_some_and(|at| now - at < Duration::milliseconds(MAX_CHAT_COOLDOWN_MS as i64));
        excluded || chatted
    }
}

/// Trim a self-declared display name and cap its length
pub fn sanitize_name(name: &str) -> String {
    let trimmed: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    if trimmed.is_empty() {
        "Guest".to_string()
    } else {
        trimmed
    }
}

/// Represents a member for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: ConnectionId,
    pub name: String,
    pub role: Role,
    pub ready: bool,
    pub is_host: bool,
}

impl MemberView {
    pub fn of(member: &Member, host: ConnectionId) -> Self {
        Self {
            id: member.id,
            name: member.name.clone(),
            role: member.role,
            ready: member.ready,
            is_host: member.id == host,
        }
    }
}
