//! Error types for Boardroom Core

use thiserror::Error;

use crate::models::Mark;

/// Rejections produced by room, registry and engine operations.
///
/// None of these are fatal: the dispatcher answers the caller with an
/// error notification and leaves every room untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room is full")]
    RoomFull,

    #[error("Server has reached its room limit")]
    RegistryFull,

    #[error("Already in a room")]
    AlreadyInRoom,

    #[error("Not in a room")]
    NotInRoom,

    #[error("Only the host can do that")]
    NotHost,

    #[error("Not allowed in the current phase")]
    WrongPhase,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Slot {0} is already taken")]
    SlotOccupied(Mark),

    #[error("You can take a slot again in {0}s")]
    SlotExcluded(i64),

    #[error("Take a slot first")]
    NotSeated,

    #[error("Already seated")]
    AlreadySeated,

    #[error("The host cannot be kicked")]
    CannotKickHost,

    #[error("Member not found")]
    MemberNotFound,

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Slow down")]
    RateLimited,

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

/// Classes of room and registry rejections.
///
/// Only the classes a transition can produce live here. Malformed input
/// is a transport concern (`boardroom_net::Error`), and a lost connection
/// is not an error at all: it runs the ordinary leave transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong phase, wrong turn, missing privilege and friends
    Precondition,
    /// Room or registry is at capacity
    Capacity,
}

impl Error {
    /// Class of the rejection, logged with it by the dispatcher
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RoomFull | Error::RegistryFull => ErrorKind::Capacity,
            _ => ErrorKind::Precondition,
        }
    }

    /// Stable machine-readable code sent alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            Error::RoomNotFound(_) => "roomNotFound",
            Error::RoomFull => "roomFull",
            Error::RegistryFull => "registryFull",
            Error::AlreadyInRoom => "alreadyInRoom",
            Error::NotInRoom => "notInRoom",
            Error::NotHost => "notHost",
            Error::WrongPhase => "wrongPhase",
            Error::NotYourTurn => "notYourTurn",
            Error::SlotOccupied(_) => "slotOccupied",
            Error::SlotExcluded(_) => "slotExcluded",
            Error::NotSeated => "notSeated",
            Error::AlreadySeated => "alreadySeated",
            Error::CannotKickHost => "cannotKickHost",
            Error::MemberNotFound => "memberNotFound",
            Error::IllegalMove(_) => "illegalMove",
            Error::RateLimited => "rateLimited",
            Error::InvalidSettings(_) => "invalidSettings",
            Error::InvalidColor(_) => "invalidColor",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
