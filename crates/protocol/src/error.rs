//! Typed error surface for the protocol crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("unexpected end of stream mid-command")]
    UnexpectedEof,
}
