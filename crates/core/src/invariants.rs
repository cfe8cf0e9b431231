//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible room states during
//! development. These checks are compiled out in release builds.

use crate::engine::Board;
use crate::models::{Mark, Phase};
use crate::room::Room;

/// Validate that a room's state is internally consistent
pub fn assert_room_invariants(room: &Room) {
    // A non-empty room always has a host among its members
    debug_assert!(
        room.is_empty() || room.is_member(room.host()),
        "Room {} host {} is not a member",
        room.code(),
        room.host()
    );

    debug_assert!(
        room.len() <= room.settings().max_members,
        "Room {} holds {} members, cap is {}",
        room.code(),
        room.len(),
        room.settings().max_members
    );

    assert_slot_invariants(room);
    assert_phase_invariants(room);
}

/// Slots and member roles must agree in both directions
pub fn assert_slot_invariants(room: &Room) {
    debug_assert!(
        room.occupant(Mark::O).is_none() || room.occupant(Mark::O) != room.occupant(Mark::X),
        "Room {} seats one member in both slots",
        room.code()
    );

    for mark in Mark::ALL {
        if let Some(id) = room.occupant(mark) {
            let role = room.member(id).map(|m| m.role);
            debug_assert!(
                role.and_then(|r| r.mark()) == Some(mark),
                "Room {} slot {} holds {} whose role is {:?}",
                room.code(),
                mark,
                id,
                role
            );
        }
    }

    for member in room.members() {
        if let Some(mark) = member.role.mark() {
            debug_assert!(
                room.occupant(mark) == Some(member.id),
                "Member {} has role {} but slot {} holds {:?}",
                member.id,
                member.role,
                mark,
                room.occupant(mark)
            );
        }
    }
}

/// A board exists exactly while a match is running or just finished
pub fn assert_phase_invariants(room: &Room) {
    match room.phase() {
        Phase::Lobby => {
            debug_assert!(
                room.board().is_none(),
                "Room {} is in the lobby with a board",
                room.code()
            );
        }
        Phase::InMatch | Phase::PostMatch => {
            debug_assert!(
                room.board().is_some(),
                "Room {} is in {:?} without a board",
                room.code(),
                room.phase()
            );
            debug_assert!(
                Mark::ALL.iter().all(|&m| room.occupant(m).is_some()),
                "Room {} is in {:?} with an empty slot",
                room.code(),
                room.phase()
            );
            debug_assert!(
                room.board().map(Board::kind) == Some(room.game_kind()),
                "Room {} board does not match its game",
                room.code()
            );
        }
    }
}
