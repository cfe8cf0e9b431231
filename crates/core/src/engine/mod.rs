//! Board engines
//!
//! A room drives exactly one engine per match through the [`BoardEngine`]
//! contract. [`Board`] picks the implementation from the room's game kind.

pub mod othello;
pub mod tictactoe;

pub use othello::Othello;
pub use tictactoe::TicTacToe;

use crate::error::Result;
use crate::models::{GameKind, Mark, MatchResult, Settings};
use crate::protocol::BoardView;

/// What happened after an accepted move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Turn moved to the other mark
    Continue,
    /// `passed` had no legal move, so the mover goes again
    Passed { passed: Mark },
    Finished(MatchResult),
}

/// Move validation and resolution shared by every game
pub trait BoardEngine {
    /// Mark allowed to move next
    fn turn(&self) -> Mark;

    /// Validate and apply a move. A rejected move leaves the board untouched.
    fn apply_move(&mut self, mark: Mark, cell: usize) -> Result<MoveOutcome>;

    /// Score the position as it stands, used when a player asks to end early
    fn adjudicate(&self) -> MatchResult;

    fn view(&self) -> BoardView;
}

/// The engine state of a running or finished match
#[derive(Debug, Clone)]
pub enum Board {
    TicTacToe(TicTacToe),
    Othello(Othello),
}

impl Board {
    /// Fresh board for a new match
    pub fn new(kind: GameKind, settings: &Settings) -> Self {
        match kind {
            GameKind::TicTacToe => Board::TicTacToe(TicTacToe::new(settings)),
            GameKind::Othello => Board::Othello(Othello::new()),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            Board::TicTacToe(_) => GameKind::TicTacToe,
            Board::Othello(_) => GameKind::Othello,
        }
    }
}

impl BoardEngine for Board {
    fn turn(&self) -> Mark {
        match self {
            Board::TicTacToe(b) => b.turn(),
            Board::Othello(b) => b.turn(),
        }
    }

    fn apply_move(&mut self, mark: Mark, cell: usize) -> Result<MoveOutcome> {
        match self {
            Board::TicTacToe(b) => b.apply_move(mark, cell),
            Board::Othello(b) => b.apply_move(mark, cell),
        }
    }

    fn adjudicate(&self) -> MatchResult {
        match self {
            Board::TicTacToe(b) => b.adjudicate(),
            Board::Othello(b) => b.adjudicate(),
        }
    }

    fn view(&self) -> BoardView {
        match self {
            Board::TicTacToe(b) => b.view(),
            Board::Othello(b) => b.view(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_follows_kind() {
        let settings = Settings::defaults_for(GameKind::Othello);
        let board = Board::new(GameKind::Othello, &settings);
        assert_eq!(board.kind(), GameKind::Othello);
        assert_eq!(board.view().cells.len(), 64);
        assert_eq!(board.turn(), Mark::O);

        let settings = Settings {
            board_size: 4,
            ..Settings::default()
        };
        let board = Board::new(GameKind::TicTacToe, &settings);
        assert_eq!(board.view().cells.len(), 16);
    }
}
