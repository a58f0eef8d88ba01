use std::io;
use thiserror::Error;

/// Errors raised while framing or decoding the shared on-disk primitives.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt record: {0}")]
    Corrupt(&'static str),
}
