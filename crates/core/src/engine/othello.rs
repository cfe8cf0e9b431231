//! Othello on the standard 8x8 board
//!
//! Cells are indexed row-major. Walking a direction is done on linear
//! indices, so every step also checks the column delta: index arithmetic
//! alone cannot tell "one to the right" from "first cell of the next row".

use crate::error::{Error, Result};
use crate::models::{Mark, MatchResult, OTHELLO_SIZE};
use crate::protocol::{BoardView, Score};

use super::{BoardEngine, MoveOutcome};

const CELLS: usize = OTHELLO_SIZE * OTHELLO_SIZE;

/// Linear offset and the column change one step must produce
const DIRECTIONS: [(isize, isize); 8] = [
    (-9, -1),
    (-8, 0),
    (-7, 1),
    (-1, -1),
    (1, 1),
    (7, -1),
    (8, 0),
    (9, 1),
];

/// One step from `index`, or `None` when it would leave the board
fn step(index: usize, offset: isize, col_delta: isize) -> Option<usize> {
    let next = index as isize + offset;
    if !(0..CELLS as isize).contains(&next) {
        return None;
    }
    let next = next as usize;
    let moved = (next % OTHELLO_SIZE) as isize - (index % OTHELLO_SIZE) as isize;
    (moved == col_delta).then_some(next)
}

/// Opponent disks bracketed by a `mark` disk placed at `index`
fn captures(cells: &[Option<Mark>; CELLS], index: usize, mark: Mark) -> Vec<usize> {
    if cells[index].is_some() {
        return Vec::new();
    }

    let mut flips = Vec::new();
    for (offset, col_delta) in DIRECTIONS {
        let mut run = Vec::new();
        let mut cursor = step(index, offset, col_delta);
        while let Some(i) = cursor {
            match cells[i] {
                Some(m) if m != mark => {
                    run.push(i);
                    cursor = step(i, offset, col_delta);
                }
                Some(_) => {
                    flips.append(&mut run);
                    break;
                }
                None => break,
            }
        }
    }
    flips
}

#[derive(Debug, Clone)]
pub struct Othello {
    cells: [Option<Mark>; CELLS],
    turn: Mark,
    last_move: Option<usize>,
}

impl Othello {
    /// Standard opening: O on 27 and 36, X on 28 and 35, O to move
    pub fn new() -> Self {
        let mut cells = [None; CELLS];
        cells[27] = Some(Mark::O);
        cells[36] = Some(Mark::O);
        cells[28] = Some(Mark::X);
        cells[35] = Some(Mark::X);
        Self {
            cells,
            turn: Mark::O,
            last_move: None,
        }
    }

    /// Board holding only the given disks
    #[cfg(test)]
    pub(crate) fn with_disks(disks: &[(usize, Mark)], turn: Mark) -> Self {
        let mut cells = [None; CELLS];
        for &(index, mark) in disks {
            cells[index] = Some(mark);
        }
        Self {
            cells,
            turn,
            last_move: None,
        }
    }

    pub fn cells(&self) -> &[Option<Mark>] {
        &self.cells
    }

    pub fn legal_moves(&self, mark: Mark) -> Vec<usize> {
        (0..CELLS)
            .filter(|&i| !captures(&self.cells, i, mark).is_empty())
            .collect()
    }

    fn has_move(&self, mark: Mark) -> bool {
        (0..CELLS).any(|i| !captures(&self.cells, i, mark).is_empty())
    }

    pub fn score(&self) -> Score {
        self.cells.iter().fold(Score::default(), |mut score, cell| {
            match cell {
                Some(Mark::O) => score.o += 1,
                Some(Mark::X) => score.x += 1,
                None => {}
            }
            score
        })
    }

    fn standing(&self) -> MatchResult {
        let score = self.score();
        match score.o.cmp(&score.x) {
            std::cmp::Ordering::Greater => MatchResult::Win(Mark::O),
            std::cmp::Ordering::Less => MatchResult::Win(Mark::X),
            std::cmp::Ordering::Equal => MatchResult::Draw,
        }
    }
}

impl Default for Othello {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardEngine for Othello {
    fn turn(&self) -> Mark {
        self.turn
    }

    fn apply_move(&mut self, mark: Mark, cell: usize) -> Result<MoveOutcome> {
        if mark != self.turn {
            return Err(Error::NotYourTurn);
        }
        if cell >= CELLS {
            return Err(Error::IllegalMove(format!("cell {} is off the board", cell)));
        }
        if self.cells[cell].is_some() {
            return Err(Error::IllegalMove(format!("cell {} is taken", cell)));
        }
        let flips = captures(&self.cells, cell, mark);
        if flips.is_empty() {
            return Err(Error::IllegalMove(format!("cell {} flips nothing", cell)));
        }

        self.cells[cell] = Some(mark);
        for i in flips {
            self.cells[i] = Some(mark);
        }
        self.last_move = Some(cell);

        let opponent = mark.opponent();
        if self.has_move(opponent) {
            self.turn = opponent;
            Ok(MoveOutcome::Continue)
        } else if self.has_move(mark) {
            Ok(MoveOutcome::Passed { passed: opponent })
        } else {
            Ok(MoveOutcome::Finished(self.standing()))
        }
    }

    fn adjudicate(&self) -> MatchResult {
        self.standing()
    }

    fn view(&self) -> BoardView {
        BoardView {
            size: OTHELLO_SIZE,
            cells: self.cells.to_vec(),
            turn: self.turn,
            last_move: self.last_move,
            score: Some(self.score()),
            legal_moves: self.legal_moves(self.turn),
            fading: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(turn: Mark) -> Othello {
        Othello {
            cells: [None; CELLS],
            turn,
            last_move: None,
        }
    }

    #[test]
    fn test_opening() {
        let game = Othello::new();
        assert_eq!(game.score(), Score { o: 2, x: 2 });
        assert_eq!(game.legal_moves(Mark::O), vec![20, 29, 34, 43]);
        assert_eq!(game.legal_moves(Mark::X), vec![19, 26, 37, 44]);
    }

    #[test]
    fn test_first_move_flips_and_passes_turn() {
        let mut game = Othello::new();
        let outcome = game.apply_move(Mark::O, 20).unwrap();

        assert_eq!(outcome, MoveOutcome::Continue);
        assert_eq!(game.cells()[20], Some(Mark::O));
        assert_eq!(game.cells()[28], Some(Mark::O));
        assert_eq!(game.turn(), Mark::X);
        assert_eq!(game.score(), Score { o: 4, x: 1 });
    }

    #[test]
    fn test_unbracketed_move_is_noop() {
        let mut game = Othello::new();
        let before = game.cells;

        assert!(matches!(game.apply_move(Mark::O, 0), Err(Error::IllegalMove(_))));
        assert!(matches!(game.apply_move(Mark::O, 19), Err(Error::IllegalMove(_))));
        assert!(matches!(game.apply_move(Mark::O, 27), Err(Error::IllegalMove(_))));
        assert_eq!(game.apply_move(Mark::X, 19), Err(Error::NotYourTurn));

        assert_eq!(game.cells, before);
        assert_eq!(game.turn(), Mark::O);
    }

    #[test]
    fn test_no_wrap_from_column_zero() {
        // Row 2: X at col 0 would only bracket the O run on row 1 (cols 6, 7)
        // through a wrap, which must not happen.
        let mut game = empty(Mark::X);
        game.cells[15] = Some(Mark::O); // row 1, col 7
        game.cells[14] = Some(Mark::X); // row 1, col 6
        game.cells[7] = Some(Mark::O); // row 0, col 7
        game.cells[23] = Some(Mark::O); // row 2, col 7

        // -1 from 16 is 15 (row 1 col 7), -9 is 7, +7 is 23
        assert!(captures(&game.cells, 16, Mark::X).is_empty());
        assert!(step(16, -1, -1).is_none());
        assert!(step(16, -9, -1).is_none());
        assert!(step(16, 7, -1).is_none());
    }

    #[test]
    fn test_no_wrap_from_column_seven() {
        let mut game = empty(Mark::O);
        game.cells[8] = Some(Mark::X); // row 1, col 0
        game.cells[9] = Some(Mark::O); // row 1, col 1

        // +1 from 7 lands on 8, the start of the next row
        assert!(captures(&game.cells, 7, Mark::O).is_empty());
        assert!(step(7, 1, 1).is_none());
        assert!(step(15, 9, 1).is_none());
    }

    #[test]
    fn test_multi_direction_capture() {
        let mut game = empty(Mark::O);
        // O at 0 and 16 bracket X at 8 vertically; O at 2 brackets X at 1
        game.cells[0] = Some(Mark::O);
        game.cells[8] = Some(Mark::X);
        game.cells[2] = Some(Mark::O);
        game.cells[1] = Some(Mark::X);
        game.cells[16] = None;

        let mut flips = captures(&game.cells, 16, Mark::O);
        flips.sort_unstable();
        assert_eq!(flips, vec![8]);

        game.cells[9] = Some(Mark::X);
        game.cells[18] = None;
        // From 18: up-left 9 then 0 (O); up 10 empty
        let flips = captures(&game.cells, 18, Mark::O);
        assert_eq!(flips, vec![9]);
    }

    #[test]
    fn test_pass_when_opponent_stuck() {
        // O X . on row 0 and O X . on row 7. After O takes 2, X's only disk
        // is 57 and nothing it could bracket, while O can still play 58.
        let mut game = empty(Mark::O);
        game.cells[0] = Some(Mark::O);
        game.cells[1] = Some(Mark::X);
        game.cells[56] = Some(Mark::O);
        game.cells[57] = Some(Mark::X);

        let outcome = game.apply_move(Mark::O, 2).unwrap();
        assert_eq!(game.cells()[1], Some(Mark::O));
        assert_eq!(outcome, MoveOutcome::Passed { passed: Mark::X });
        assert_eq!(game.turn(), Mark::O);
        assert!(game.legal_moves(Mark::X).is_empty());
        assert_eq!(game.legal_moves(Mark::O), vec![58]);
    }

    #[test]
    fn test_double_pass_ends_by_count() {
        // Neither side can move once O takes 2
        let mut game = empty(Mark::O);
        game.cells[0] = Some(Mark::O);
        game.cells[1] = Some(Mark::X);
        game.cells[63] = Some(Mark::X);

        let outcome = game.apply_move(Mark::O, 2).unwrap();
        assert_eq!(game.score(), Score { o: 3, x: 1 });
        assert_eq!(outcome, MoveOutcome::Finished(MatchResult::Win(Mark::O)));
    }

    #[test]
    fn test_double_pass_tie_is_draw() {
        let mut game = empty(Mark::O);
        game.cells[0] = Some(Mark::O);
        game.cells[1] = Some(Mark::X);
        game.cells[61] = Some(Mark::X);
        game.cells[62] = Some(Mark::X);
        game.cells[63] = Some(Mark::X);

        let outcome = game.apply_move(Mark::O, 2).unwrap();
        assert_eq!(game.score(), Score { o: 3, x: 3 });
        assert_eq!(outcome, MoveOutcome::Finished(MatchResult::Draw));
        assert_eq!(game.adjudicate(), MatchResult::Draw);
    }

    #[test]
    fn test_view_lists_moves_for_side_to_move() {
        let view = Othello::new().view();
        assert_eq!(view.size, 8);
        assert_eq!(view.score, Some(Score { o: 2, x: 2 }));
        assert_eq!(view.legal_moves, vec![20, 29, 34, 43]);
    }
}
