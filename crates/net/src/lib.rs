//! Boardroom Network Library
//!
//! TCP transport for the Boardroom game server.
//!
//! # Architecture
//!
//! - **Server**: accepts connections and runs one read task and one
//!   writer task per peer
//! - **Protocol**: length-prefixed JSON frames carrying intents and
//!   notifications
//!
//! # Usage
//!
//! ```ignore
//! let server = Server::start(ServerConfig::default()).await?;
//! println!("listening on {}", server.addr());
//! tokio::signal::ctrl_c().await?;
//! server.shutdown();
//! ```

pub mod config;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod server;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use protocol::{ClientFrame, ServerFrame};
pub use server::Server;

/// Default port for Boardroom servers
pub const DEFAULT_PORT: u16 = 8080;
