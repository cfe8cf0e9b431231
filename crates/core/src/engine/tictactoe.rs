//! Tic-tac-toe on an N x N board
//!
//! Win length is 3 on 3x3, 4 on 4x4 and 5 on anything larger. Every
//! contiguous run of that length is precomputed once per match. In limit
//! mode each player keeps at most three pieces; the oldest one is lifted
//! before a fourth is placed.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::models::{Mark, MatchResult, Settings};
use crate::protocol::BoardView;

use super::{BoardEngine, MoveOutcome};

/// Live pieces per player in limit mode
pub const LIMITED_PIECES: usize = 3;

/// Run length needed to win on a board of `size`
pub fn win_length(size: usize) -> usize {
    match size {
        3 => 3,
        4 => 4,
        _ => 5,
    }
}

/// All horizontal, vertical and diagonal runs of exactly `len` cells
pub fn win_lines(size: usize, len: usize) -> Vec<Vec<usize>> {
    if len == 0 || len > size {
        return Vec::new();
    }

    let span = size - len + 1;
    let mut lines = Vec::new();

    // Rows
    for row in 0..size {
        for col in 0..span {
            lines.push((0..len).map(|k| row * size + col + k).collect());
        }
    }

    // Columns
    for row in 0..span {
        for col in 0..size {
            lines.push((0..len).map(|k| (row + k) * size + col).collect());
        }
    }

    // Diagonals, down-right then down-left
    for row in 0..span {
        for col in 0..span {
            lines.push((0..len).map(|k| (row + k) * size + col + k).collect());
        }
    }
    for row in 0..span {
        for col in (len - 1)..size {
            lines.push((0..len).map(|k| (row + k) * size + col - k).collect());
        }
    }

    lines
}

#[derive(Debug, Clone)]
pub struct TicTacToe {
    size: usize,
    cells: Vec<Option<Mark>>,
    lines: Vec<Vec<usize>>,
    limit_mode: bool,
    highlight_oldest: bool,
    /// Placement order per mark, oldest first
    placed: [VecDeque<usize>; 2],
    turn: Mark,
    last_move: Option<usize>,
}

impl TicTacToe {
    pub fn new(settings: &Settings) -> Self {
        let size = settings.board_size;
        let limit_mode = settings.limit_mode && size == 3;
        Self {
            size,
            cells: vec![None; size * size],
            lines: win_lines(size, win_length(size)),
            limit_mode,
            highlight_oldest: limit_mode && settings.highlight_oldest,
            placed: [VecDeque::new(), VecDeque::new()],
            turn: Mark::O,
            last_move: None,
        }
    }

    pub fn cells(&self) -> &[Option<Mark>] {
        &self.cells
    }

    pub fn lines(&self) -> &[Vec<usize>] {
        &self.lines
    }

    pub fn live_pieces(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|c| **c == Some(mark)).count()
    }

    fn has_line(&self, mark: Mark) -> bool {
        self.lines
            .iter()
            .any(|line| line.iter().all(|&i| self.cells[i] == Some(mark)))
    }

    /// Cells that would be lifted on each player's next placement
    fn fading(&self) -> Vec<usize> {
        if !self.highlight_oldest {
            return Vec::new();
        }
        self.placed
            .iter()
            .filter(|queue| queue.len() >= LIMITED_PIECES)
            .filter_map(|queue| queue.front().copied())
            .collect()
    }
}

impl BoardEngine for TicTacToe {
    fn turn(&self) -> Mark {
        self.turn
    }

    fn apply_move(&mut self, mark: Mark, cell: usize) -> Result<MoveOutcome> {
        if mark != self.turn {
            return Err(Error::NotYourTurn);
        }
        if cell >= self.cells.len() {
            return Err(Error::IllegalMove(format!("cell {} is off the board", cell)));
        }
        if self.cells[cell].is_some() {
            return Err(Error::IllegalMove(format!("cell {} is taken", cell)));
        }

        let queue = &mut self.placed[mark.index()];
        if self.limit_mode && queue.len() >= LIMITED_PIECES {
            if let Some(oldest) = queue.pop_front() {
                self.cells[oldest] = None;
            }
        }
        queue.push_back(cell);
        self.cells[cell] = Some(mark);
        self.last_move = Some(cell);

        if self.has_line(mark) {
            return Ok(MoveOutcome::Finished(MatchResult::Win(mark)));
        }
        if self.cells.iter().all(Option::is_some) {
            return Ok(MoveOutcome::Finished(MatchResult::Draw));
        }

        self.turn = mark.opponent();
        Ok(MoveOutcome::Continue)
    }

    fn adjudicate(&self) -> MatchResult {
        Mark::ALL
            .into_iter()
            .find(|&mark| self.has_line(mark))
            .map_or(MatchResult::Draw, MatchResult::Win)
    }

    fn view(&self) -> BoardView {
        BoardView {
            size: self.size,
            cells: self.cells.clone(),
            turn: self.turn,
            last_move: self.last_move,
            score: None,
            legal_moves: Vec::new(),
            fading: self.fading(),
        }
    }
}
