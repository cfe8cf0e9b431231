//! Data models for Boardroom

mod game;
mod member;
mod settings;

pub use game::*;
pub use member::*;
pub use settings::*;
