//! # sstable - Sorted String Table
//!
//! Immutable, on-disk storage files for the storage engine.
//!
//! When the in-memory [`memtable::Memtable`] exceeds its size threshold the
//! engine flushes it to disk as an SST. SSTs are *write-once, read-many* --
//! once created they are never modified, only replaced during compaction.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │ data block 0 (≈16 KiB, trailing CRC32)      │
//! │ data block 1                                │
//! │ ...                                         │
//! │ index block (first_key + handle per block)  │
//! │ bloom filter block                          │
//! │ footer (52 bytes, fixed size)                │
//! └───────────────────────────────────────────┘
//! ```
//!
//! Every section -- data, index, bloom -- ends with a trailing CRC32 over its
//! body. The footer is a constant size so a reader always knows to seek to
//! `file_len - FOOTER_SIZE` first; see [`footer::Footer`] for the exact
//! layout and [`footer::MAGIC`] for the trailer value.

pub mod block;
pub mod cache;
pub mod footer;
pub mod handle;
pub mod index;
pub mod merge;
pub mod reader;
pub mod writer;

use std::io;

use thiserror::Error;

pub use cache::BlockCache;
pub use merge::{MergeIterator, MergedEntry};
pub use reader::SstReader;
pub use writer::{write_from_memtable, write_from_merge, SstWriter, DEFAULT_BLOOM_FPR};

#[derive(Debug, Error)]
pub enum SstableError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt sst: {0}")]
    Corrupt(&'static str),
}

impl From<record::RecordError> for SstableError {
    fn from(e: record::RecordError) -> Self {
        match e {
            record::RecordError::Io(err) => SstableError::Io(err),
            record::RecordError::Corrupt(msg) => SstableError::Corrupt(msg),
        }
    }
}
