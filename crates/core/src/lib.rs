//! Boardroom Core Library
//!
//! Rooms, board engines, the room registry and the session dispatcher for
//! the Boardroom game server. Nothing in here does I/O.

pub mod config;
pub mod engine;
pub mod error;
pub mod invariants;
pub mod models;
pub mod permissions;
pub mod protocol;
pub mod registry;
pub mod room;
pub mod session;

pub use config::Limits;
pub use engine::{Board, BoardEngine, MoveOutcome};
pub use error::{Error, ErrorKind, Result};
pub use models::*;
pub use permissions::*;
pub use protocol::*;
pub use registry::RoomRegistry;
pub use room::Room;
pub use session::{Dispatcher, Envelope};
