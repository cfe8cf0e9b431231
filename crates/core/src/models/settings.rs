//! Room settings and their per-game defaults

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::GameKind;

pub const MIN_MEMBERS: usize = 2;
pub const MAX_MEMBERS: usize = 100;
pub const DEFAULT_MAX_MEMBERS: usize = 10;

/// Smallest and largest accepted tic-tac-toe board
pub const TICTACTOE_SIZES: std::ops::RangeInclusive<usize> = 3..=10;

/// Othello is always played on 8x8
pub const OTHELLO_SIZE: usize = 8;

/// Who ends up in slot O when a match starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerOrder {
    /// A seated host always plays O
    HostO,
    /// A seated host always plays X
    HostX,
    /// Occupants are swapped with probability 1/2
    Random,
    /// Marks follow the slots as they were taken
    #[default]
    Assigned,
}

/// Host-editable room settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub board_size: usize,
    pub player_order: PlayerOrder,
    /// Each player keeps at most three live pieces (3x3 tic-tac-toe only)
    pub limit_mode: bool,
    /// Point out the piece that will be removed next in limit mode
    pub highlight_oldest: bool,
    pub is_public: bool,
    pub max_members: usize,
}

impl Settings {
    pub fn defaults_for(kind: GameKind) -> Self {
        let board_size = match kind {
            GameKind::TicTacToe => 3,
            GameKind::Othello => OTHELLO_SIZE,
        };
        Self {
            board_size,
            player_order: PlayerOrder::default(),
            limit_mode: false,
            highlight_oldest: false,
            is_public: false,
            max_members: DEFAULT_MAX_MEMBERS,
        }
    }

    /// Validate against `kind` and drop options that do not apply to it
    pub fn normalized(mut self, kind: GameKind) -> Result<Self> {
        if !(MIN_MEMBERS..=MAX_MEMBERS).contains(&self.max_members) {
            return Err(Error::InvalidSettings(format!(
                "max members must be between {} and {}",
                MIN_MEMBERS, MAX_MEMBERS
            )));
        }

        match kind {
            GameKind::TicTacToe => {
                if !TICTACTOE_SIZES.contains(&self.board_size) {
                    return Err(Error::InvalidSettings(format!(
                        "board size must be between {} and {}",
                        TICTACTOE_SIZES.start(),
                        TICTACTOE_SIZES.end()
                    )));
                }
                if self.board_size != 3 {
                    self.limit_mode = false;
                }
            }
            GameKind::Othello => {
                self.board_size = OTHELLO_SIZE;
                self.limit_mode = false;
            }
        }

        if !self.limit_mode {
            self.highlight_oldest = false;
        }

        Ok(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults_for(GameKind::TicTacToe)
    }
}
