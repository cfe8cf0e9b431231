//! Match transitions: moves, early endings and the way back to the lobby

use tracing::info;

use crate::engine::{BoardEngine, MoveOutcome};
use crate::error::{Error, Result};
use crate::models::{ConnectionId, EndReason, Mark, MatchResult, Phase};
use crate::permissions::RoomAction;
use crate::protocol::{Notification, Outbound};

use super::Room;

impl Room {
    pub fn submit_move(&mut self, caller: ConnectionId, cell: usize) -> Result<Vec<Outbound>> {
        let mark = self
            .authorize(caller, RoomAction::SubmitMove)?
            .mark()
            .ok_or(Error::NotSeated)?;
        let board = self.board.as_mut().ok_or(Error::WrongPhase)?;
        if board.turn() != mark {
            return Err(Error::NotYourTurn);
        }

        let outcome = board.apply_move(mark, cell)?;
        let mut out = vec![Outbound::all(Notification::BoardUpdated {
            board: board.view(),
        })];
        match outcome {
            MoveOutcome::Continue => {}
            MoveOutcome::Passed { passed } => {
                out.push(Outbound::all(Notification::PassTurn { passed, next: mark }));
            }
            MoveOutcome::Finished(result) => {
                out.extend(self.finish(result, EndReason::Board));
            }
        }
        Ok(out)
    }

    /// Concede; the opponent wins
    pub fn surrender(&mut self, caller: ConnectionId) -> Result<Vec<Outbound>> {
        let mark = self
            .authorize(caller, RoomAction::Surrender)?
            .mark()
            .ok_or(Error::NotSeated)?;
        Ok(self.finish(MatchResult::Win(mark.opponent()), EndReason::Surrender))
    }

    /// End the match now and score the position as it stands
    pub fn declare_game_over(&mut self, caller: ConnectionId) -> Result<Vec<Outbound>> {
        self.authorize(caller, RoomAction::DeclareGameOver)?;
        let result = self
            .board
            .as_ref()
            .map(|b| b.adjudicate())
            .ok_or(Error::WrongPhase)?;
        Ok(self.finish(result, EndReason::Adjudicated))
    }

    /// Ask to go back to the lobby. Once both players have asked, the
    /// slots are emptied and the room reopens for a new match.
    pub fn return_to_lobby(&mut self, caller: ConnectionId) -> Result<Vec<Outbound>> {
        self.authorize(caller, RoomAction::ReturnToLobby)?;
        if let Some(member) = self.members.get_mut(&caller) {
            member.ready = true;
        }

        let both = Mark::ALL.iter().all(|&mark| {
            self.occupant(mark)
                .and_then(|id| self.members.get(&id))
                .is_some_and(|m| m.ready)
        });
        if both {
            for mark in Mark::ALL {
                self.vacate(mark);
            }
            self.clear_ready();
            self.board = None;
            self.phase = Phase::Lobby;
            info!(room = %self.code, "Back to lobby");
        }
        Ok(vec![Outbound::all(self.lobby_notification())])
    }

    fn finish(&mut self, result: MatchResult, reason: EndReason) -> Vec<Outbound> {
        self.phase = Phase::PostMatch;
        self.clear_ready();
        info!(room = %self.code, ?result, ?reason, "Match finished");

        match &self.board {
            Some(board) => vec![Outbound::all(Notification::GameOver {
                result,
                reason,
                board: board.view(),
            })],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::engine::{Board, Othello};
    use crate::invariants::assert_room_invariants;
    use crate::models::{GameKind, Role, Settings};
    use crate::protocol::Audience;

    fn game_over(out: &[Outbound]) -> Option<(MatchResult, EndReason)> {
        out.iter().find_map(|o| match &o.notification {
            Notification::GameOver { result, reason, .. } => Some((*result, *reason)),
            _ => None,
        })
    }

    #[test]
    fn test_tictactoe_row_win() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        let (o, x) = (ids[0], ids[1]);
        start(&mut room, o, x);

        for (who, cell) in [(o, 0), (x, 4), (o, 1), (x, 5)] {
            let out = room.submit_move(who, cell).unwrap();
            assert_eq!(game_over(&out), None);
        }
        let out = room.submit_move(o, 2).unwrap();

        assert_eq!(
            game_over(&out),
            Some((MatchResult::Win(Mark::O), EndReason::Board))
        );
        assert_eq!(room.phase(), Phase::PostMatch);
        assert!(matches!(notes(&out)[0], Notification::BoardUpdated { .. }));
        assert_room_invariants(&room);
    }

    #[test]
    fn test_move_out_of_turn() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 3);
        start(&mut room, ids[0], ids[1]);

        assert_eq!(room.submit_move(ids[1], 0), Err(Error::NotYourTurn));
        assert_eq!(room.submit_move(ids[2], 0), Err(Error::NotSeated));
        room.submit_move(ids[0], 0).unwrap();
        assert!(matches!(
            room.submit_move(ids[1], 0),
            Err(Error::IllegalMove(_))
        ));
    }

    #[test]
    fn test_move_outside_match() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        room.take_slot(ids[0], Mark::O, now()).unwrap();
        assert_eq!(room.submit_move(ids[0], 0), Err(Error::WrongPhase));
    }

    #[test]
    fn test_othello_opening_move() {
        let (mut room, ids) = room_with(GameKind::Othello, Settings::default(), 2);
        start(&mut room, ids[0], ids[1]);

        let out = room.submit_move(ids[0], 19).unwrap_err();
        assert!(matches!(out, Error::IllegalMove(_)));

        let out = room.submit_move(ids[0], 20).unwrap();
        let sent = notes(&out);
        let Notification::BoardUpdated { board } = sent[0] else {
            panic!("expected board update");
        };
        assert_eq!(board.turn, Mark::X);
        assert_eq!(board.cells[28], Some(Mark::O));
    }

    #[test]
    fn test_othello_pass_is_announced() {
        let (mut room, ids) = room_with(GameKind::Othello, Settings::default(), 2);
        start(&mut room, ids[0], ids[1]);
        // After O takes 2, X keeps only 57 and has nothing to bracket
        room.board = Some(Board::Othello(Othello::with_disks(
            &[(0, Mark::O), (1, Mark::X), (56, Mark::O), (57, Mark::X)],
            Mark::O,
        )));

        let out = room.submit_move(ids[0], 2).unwrap();
        let sent = notes(&out);
        assert_eq!(sent.len(), 2);
        let Notification::BoardUpdated { board } = sent[0] else {
            panic!("expected board update");
        };
        assert_eq!(board.turn, Mark::O);
        assert_eq!(
            sent[1],
            &Notification::PassTurn {
                passed: Mark::X,
                next: Mark::O,
            }
        );
        assert!(out.iter().all(|o| o.audience == Audience::All));
        assert_eq!(room.phase(), Phase::InMatch);

        assert_eq!(room.submit_move(ids[1], 58), Err(Error::NotYourTurn));
        room.submit_move(ids[0], 58).unwrap();
    }

    #[test]
    fn test_surrender() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        start(&mut room, ids[0], ids[1]);

        let out = room.surrender(ids[0]).unwrap();
        assert_eq!(
            game_over(&out),
            Some((MatchResult::Win(Mark::X), EndReason::Surrender))
        );
        assert_eq!(room.surrender(ids[1]), Err(Error::WrongPhase));
    }

    #[test]
    fn test_declare_game_over_scores_position() {
        let (mut room, ids) = room_with(GameKind::Othello, Settings::default(), 2);
        start(&mut room, ids[0], ids[1]);
        room.submit_move(ids[0], 20).unwrap();

        let out = room.declare_game_over(ids[1]).unwrap();
        assert_eq!(
            game_over(&out),
            Some((MatchResult::Win(Mark::O), EndReason::Adjudicated))
        );
    }

    #[test]
    fn test_return_to_lobby_waits_for_both() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        start(&mut room, ids[0], ids[1]);
        room.surrender(ids[1]).unwrap();

        room.return_to_lobby(ids[0]).unwrap();
        assert_eq!(room.phase(), Phase::PostMatch);
        assert!(room.board().is_some());

        room.return_to_lobby(ids[1]).unwrap();
        assert_eq!(room.phase(), Phase::Lobby);
        assert!(room.board().is_none());
        assert_eq!(room.occupant(Mark::O), None);
        assert_eq!(room.member(ids[1]).unwrap().role, Role::Spectator);
        assert_room_invariants(&room);
    }

    #[test]
    fn test_leave_in_post_match_resets() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 3);
        start(&mut room, ids[0], ids[1]);
        room.surrender(ids[0]).unwrap();

        room.remove_member(ids[0]);
        assert_eq!(room.phase(), Phase::Lobby);
        assert_eq!(room.host(), ids[1]);
        assert_room_invariants(&room);
    }
}
