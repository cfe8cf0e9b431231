//! Intent and notification records exchanged with the transport
//!
//! The core never does I/O. The transport decodes an [`Intent`], hands it to
//! the dispatcher, and writes out whatever [`Notification`]s come back.

mod intent;
mod notification;
mod views;

pub use intent::*;
pub use notification::*;
pub use views::*;
