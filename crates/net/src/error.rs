//! Network error types

use std::io;

use crate::frame::MAX_FRAME_SIZE;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Empty frame")]
    EmptyFrame,

    #[error("Frame too large: {0} bytes (max {max})", max = MAX_FRAME_SIZE)]
    FrameTooLarge(usize),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
