//! Permission system for room operations

use crate::models::{Phase, Role};

/// Actions a member can attempt inside a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomAction {
    // Room management
    UpdateSettings,
    ChangeGameKind,
    KickMember,

    // Lobby
    TakeSlot,
    LeaveSlot,
    UpdateSlotColor,
    SetReady,

    // Match
    SubmitMove,
    Surrender,
    DeclareGameOver,
    ReturnToLobby,

    // Chat
    SendChat,
}

/// What the acting member is, as far as permissions go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Host,
    Member,
}

/// Permission matrix for room actions
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Check if a privilege level may perform an action
    pub fn can_perform(privilege: Privilege, action: RoomAction) -> bool {
        match action {
            // Room management - host only
            RoomAction::UpdateSettings | RoomAction::ChangeGameKind | RoomAction::KickMember => {
                privilege == Privilege::Host
            }
            _ => true,
        }
    }

    /// Phases in which an action is accepted
    pub fn allowed_in(action: RoomAction, phase: Phase) -> bool {
        match action {
            RoomAction::UpdateSettings
            | RoomAction::ChangeGameKind
            | RoomAction::TakeSlot
            | RoomAction::LeaveSlot
            | RoomAction::SetReady => phase == Phase::Lobby,

            RoomAction::SubmitMove | RoomAction::Surrender | RoomAction::DeclareGameOver => {
                phase == Phase::InMatch
            }

            RoomAction::ReturnToLobby => phase == Phase::PostMatch,

            RoomAction::KickMember | RoomAction::UpdateSlotColor | RoomAction::SendChat => true,
        }
    }

    /// Whether the actor must hold a slot
    pub fn requires_seat(action: RoomAction) -> bool {
        matches!(
            action,
            RoomAction::LeaveSlot
                | RoomAction::UpdateSlotColor
                | RoomAction::SetReady
                | RoomAction::SubmitMove
                | RoomAction::Surrender
                | RoomAction::DeclareGameOver
                | RoomAction::ReturnToLobby
        )
    }

    /// Check if an actor can kick a target
    pub fn can_kick(actor: Privilege, target: Privilege) -> bool {
        actor == Privilege::Host && target != Privilege::Host
    }

    /// Check if a role may claim a slot
    pub fn can_take_slot(role: Role) -> bool {
        role == Role::Spectator
    }
}
