use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt wal segment: {0}")]
    Corrupt(&'static str),

    #[error("record body exceeds the {0} byte limit")]
    RecordTooLarge(usize),

    #[error("wal writer thread has shut down")]
    Closed,
}

impl From<record::RecordError> for WalError {
    fn from(e: record::RecordError) -> Self {
        match e {
            record::RecordError::Io(err) => WalError::Io(err),
            record::RecordError::Corrupt(msg) => WalError::Corrupt(msg),
        }
    }
}
