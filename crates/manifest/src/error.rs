use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt manifest: {0}")]
    Corrupt(&'static str),
}

impl From<record::RecordError> for ManifestError {
    fn from(e: record::RecordError) -> Self {
        match e {
            record::RecordError::Io(err) => ManifestError::Io(err),
            record::RecordError::Corrupt(msg) => ManifestError::Corrupt(msg),
        }
    }
}
