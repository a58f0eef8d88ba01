//! # wal — Write-Ahead Log
//!
//! Durable, append-only log of every mutation applied to the storage
//! engine, written before the mutation is applied in memory.
//!
//! Mutations are grouped into segments (`wal-<seqNo>.log`, named by the
//! first sequence number each one holds) and committed in batches: many
//! concurrent `append` calls share a single `flush + fsync` performed by
//! one dedicated writer thread, trading a little latency for much higher
//! throughput under write load. See [`writer::WalWriter`] for the writer
//! side and [`scanner`] for replay.

mod error;
mod scanner;
mod segment;
mod writer;

pub use error::WalError;
pub use scanner::{scan, scan_all};
pub use segment::{list_segments, parse_segment_seq, segment_path};
pub use writer::{WalWriter, DEFAULT_SEGMENT_BYTES, MAX_RECORD_BYTES};

pub use record::{Op, Record};
