//! # engine — the storage engine's orchestrator
//!
//! Ties [`memtable`], [`wal`], [`sstable`] and [`manifest`] together into a
//! single LSM-tree key-value store: the write path appends to the WAL before
//! applying to the active memtable; a background ticker flushes a full
//! memtable to a new SST; a second ticker compacts the live SST set once it
//! grows past a threshold and retires WAL segments and orphaned SST files
//! once nothing can reference them anymore.
//!
//! ## Concurrency
//!
//! All engine state lives behind one [`RwLock`]. It is only ever held long
//! enough to apply a mutation, swap the active/immutable memtable, or
//! publish a new SST/manifest version -- WAL I/O, SST I/O and the bulk of
//! flush/compaction work run with the lock released. SSTs are reference
//! counted via [`Arc`] so a reader can keep using one that a concurrent
//! compaction has just replaced.
//!
//! ## Keyspace
//!
//! Callers address a `(db, key)` pair; the engine folds `db` into a 4-byte
//! big-endian prefix (see [`record::internal_key`]) so the memtable, SSTs and
//! manifest only ever deal with one flat keyspace.

mod cleanup;
mod compaction;
mod error;
mod flush;
mod options;
mod read;
mod recovery;
mod write;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

use manifest::Descriptor;
use memtable::Memtable;
use sstable::{BlockCache, SstReader};
use wal::WalWriter;

pub use error::LsmError;
pub use options::EngineOptions;

/// Maximum allowed external key size (64 KiB).
pub const MAX_KEY_SIZE: usize = 64 * 1024;
/// Maximum allowed value size (10 MiB).
pub const MAX_VALUE_SIZE: usize = 10 * 1024 * 1024;

/// Current wall-clock time as nanoseconds since the Unix epoch. Used both
/// for record timestamps and for naming new SST files
/// (`<20-digit zero-padded nanoseconds>.sst`).
pub(crate) fn now_nanos() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

pub(crate) struct State {
    active: Memtable,
    /// Set while a flush is draining it to disk. Reads still consult it.
    immutable: Option<Arc<Memtable>>,
    /// Live SSTs, newest first.
    ssts: Vec<Arc<SstReader>>,
    descriptor: Descriptor,
    /// Filenames currently being merged by compaction, excluded from the
    /// cleanup ticker's orphan sweep even though they may momentarily not
    /// appear in `ssts`/`descriptor` anymore.
    compacting: HashSet<String>,
}

pub(crate) struct Inner {
    state: RwLock<State>,
    cache: Arc<BlockCache>,
    wal: WalWriter,
    sst_dir: PathBuf,
    wal_dir: PathBuf,
    options: EngineOptions,
    flushing: AtomicBool,
    compacting_now: AtomicBool,
}

/// A handle to an open database. Cheap to clone -- every clone shares the
/// same engine state; the last one dropped shuts the background tickers down
/// and flushes any remaining in-memory data.
pub struct Engine {
    inner: Arc<Inner>,
    shutdown: Arc<AtomicBool>,
    flush_handle: Mutex<Option<JoinHandle<()>>>,
    compaction_handle: Mutex<Option<JoinHandle<()>>>,
    cleanup_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Opens (or creates) a database rooted at `dir`. `<dir>/wal` holds WAL
    /// segments; `<dir>/sst` holds the manifest and SST files. Recovery loads
    /// the manifest, opens its SSTs, then replays any WAL records not yet
    /// covered by one of them.
    pub fn open(dir: &std::path::Path, options: EngineOptions) -> Result<Self, LsmError> {
        let sst_dir = dir.join("sst");
        let wal_dir = dir.join("wal");
        std::fs::create_dir_all(&sst_dir)?;
        std::fs::create_dir_all(&wal_dir)?;

        let recovered = recovery::recover(&sst_dir, &wal_dir)?;
        let wal = WalWriter::open(&wal_dir, recovered.next_seq, options.wal_segment_bytes)?;
        let cache = Arc::new(BlockCache::new(
            options.block_cache_bytes,
            sstable::block::TARGET_BLOCK_SIZE,
        ));

        let state = State {
            active: recovered.active,
            immutable: None,
            ssts: recovered.ssts,
            descriptor: recovered.descriptor,
            compacting: HashSet::new(),
        };

        let inner = Arc::new(Inner {
            state: RwLock::new(state),
            cache,
            wal,
            sst_dir,
            wal_dir,
            options,
            flushing: AtomicBool::new(false),
            compacting_now: AtomicBool::new(false),
        });

        let shutdown = Arc::new(AtomicBool::new(false));
        let compaction_handle = compaction::spawn_ticker(Arc::clone(&inner), Arc::clone(&shutdown));
        let cleanup_handle = cleanup::spawn_ticker(Arc::clone(&inner), Arc::clone(&shutdown));

        let flush_handle = match flush::maybe_trigger_flush(&inner) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(?e, "post-recovery flush check failed");
                None
            }
        };

        Ok(Engine {
            inner,
            shutdown,
            flush_handle: Mutex::new(flush_handle),
            compaction_handle: Mutex::new(Some(compaction_handle)),
            cleanup_handle: Mutex::new(Some(cleanup_handle)),
        })
    }

    /// Sets `key` to `value` within database `db`. Durable once this returns:
    /// the write is fsynced to the WAL before the call completes.
    pub fn set(&self, db: u32, key: &[u8], value: Vec<u8>) -> Result<(), LsmError> {
        write::set(&self.inner, db, key, value)
    }

    /// Deletes `key` from database `db` by writing a tombstone. A no-op (but
    /// still durable) if the key was already absent.
    pub fn del(&self, db: u32, key: &[u8]) -> Result<(), LsmError> {
        write::del(&self.inner, db, key)
    }

    /// Looks up `key` in database `db`.
    pub fn get(&self, db: u32, key: &[u8]) -> Result<Option<Vec<u8>>, LsmError> {
        read::get(&self.inner, db, key)
    }

    /// Returns every live `(key, value)` pair in database `db` whose key
    /// falls in `[start, end)`. Pass `b""` for `start` to scan from the
    /// beginning and `b""` for `end` to scan to the end of the database.
    pub fn scan(&self, db: u32, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LsmError> {
        read::scan(&self.inner, db, start, end)
    }

    /// Number of live SSTs currently tracked by the manifest.
    pub fn sstable_count(&self) -> usize {
        self.inner.state.read().unwrap().ssts.len()
    }

    /// Blocks until any in-progress flush finishes and the active memtable is
    /// fully persisted to a new SST. Intended for tests and graceful
    /// shutdown paths that need a synchronous flush point.
    pub fn force_flush(&self) -> Result<(), LsmError> {
        flush::force_flush_blocking(&self.inner)
    }

    /// Blocks until a full compaction of the live SST set has run, even if
    /// `compaction_trigger_ssts` has not been reached. Intended for tests.
    pub fn force_compact(&self) -> Result<(), LsmError> {
        compaction::force_compact_blocking(&self.inner)
    }
}

/// Graceful shutdown: stop the background tickers, wait for any in-flight
/// flush/compaction to finish, then flush whatever is left in the active
/// memtable. The WAL writer closes (and its own background thread joins)
/// when the last `Arc<Inner>` drops.
impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(h) = self.compaction_handle.lock().unwrap().take() {
            let _ = h.join();
        }
        if let Some(h) = self.cleanup_handle.lock().unwrap().take() {
            let _ = h.join();
        }
        if let Some(h) = self.flush_handle.lock().unwrap().take() {
            let _ = h.join();
        }
        if let Err(e) = flush::force_flush_blocking(&self.inner) {
            tracing::warn!(?e, "flush on shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests;
