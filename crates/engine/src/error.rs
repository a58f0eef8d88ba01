//! Typed error surface for the engine crate.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LsmError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("key not found")]
    NotFound,

    #[error("corruption detected: {0}")]
    Corruption(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<record::RecordError> for LsmError {
    fn from(e: record::RecordError) -> Self {
        match e {
            record::RecordError::Io(err) => LsmError::Io(err),
            record::RecordError::Corrupt(msg) => LsmError::Corruption(msg.to_string()),
        }
    }
}

impl From<sstable::SstableError> for LsmError {
    fn from(e: sstable::SstableError) -> Self {
        match e {
            sstable::SstableError::Io(err) => LsmError::Io(err),
            sstable::SstableError::Corrupt(msg) => LsmError::Corruption(msg.to_string()),
        }
    }
}

impl From<wal::WalError> for LsmError {
    fn from(e: wal::WalError) -> Self {
        match e {
            wal::WalError::Io(err) => LsmError::Io(err),
            wal::WalError::Corrupt(msg) => LsmError::Corruption(msg.to_string()),
            wal::WalError::RecordTooLarge(max) => LsmError::InvalidArgument(format!(
                "record exceeds the {max} byte WAL record limit"
            )),
            wal::WalError::Closed => LsmError::Internal("wal writer is closed".to_string()),
        }
    }
}

impl From<manifest::ManifestError> for LsmError {
    fn from(e: manifest::ManifestError) -> Self {
        match e {
            manifest::ManifestError::Io(err) => LsmError::Io(err),
            manifest::ManifestError::Corrupt(msg) => LsmError::Corruption(msg.to_string()),
        }
    }
}
