//! Game kinds, marks, phases and match results

use serde::{Deserialize, Serialize};

/// The board game a room is set up for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameKind {
    #[default]
    TicTacToe,
    Othello,
}

impl GameKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            GameKind::TicTacToe => "Tic-Tac-Toe",
            GameKind::Othello => "Othello",
        }
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One of the two playing positions. O always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    O,
    X,
}

impl Mark {
    pub const ALL: [Mark; 2] = [Mark::O, Mark::X];

    pub fn opponent(self) -> Mark {
        match self {
            Mark::O => Mark::X,
            Mark::X => Mark::O,
        }
    }

    /// Position in per-mark arrays
    pub fn index(self) -> usize {
        match self {
            Mark::O => 0,
            Mark::X => 1,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::O => write!(f, "O"),
            Mark::X => write!(f, "X"),
        }
    }
}

/// Room lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Lobby,
    InMatch,
    PostMatch,
}

/// Final result of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchResult {
    Win(Mark),
    Draw,
}

impl MatchResult {
    pub fn winner(&self) -> Option<Mark> {
        match self {
            MatchResult::Win(mark) => Some(*mark),
            MatchResult::Draw => None,
        }
    }
}

/// Why a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    /// The board reached a terminal position
    Board,
    Surrender,
    /// A player asked the server to score the position as it stands
    Adjudicated,
}
