//! RESP wire codec: parsing client commands and serializing replies.
//!
//! Pure codec -- no knowledge of databases, keys, or the storage engine.

mod command;
mod error;
mod reply;

pub use command::{parse_command, Command};
pub use error::ProtocolError;
pub use reply::{write_reply, Reply};
