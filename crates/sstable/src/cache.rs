//! Shared LRU cache of decoded SST data blocks.
//!
//! Keyed by `(sst_id, block_offset)`, where `sst_id` is handed out once per
//! [`crate::reader::SstReader::open`] call by a process-wide atomic counter --
//! cheaper and collision-free compared to hashing the file path.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::block::{decode_block, BlockEntry};
use crate::SstableError;

static NEXT_SST_ID: AtomicU64 = AtomicU64::new(1);

/// Hands out a fresh, process-unique id for a newly opened SST file.
pub fn next_sst_id() -> u64 {
    NEXT_SST_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Hash, PartialEq, Eq, Clone, Copy)]
struct CacheKey {
    sst_id: u64,
    block_offset: u64,
}

/// A bounded, thread-safe cache of decoded data blocks shared across every
/// open SST in the engine.
pub struct BlockCache {
    inner: Mutex<LruCache<CacheKey, Arc<Vec<BlockEntry>>>>,
}

impl BlockCache {
    /// `capacity_bytes` is translated into an entry-count budget assuming
    /// the configured target block size. Blocks vary in actual size, so this
    /// is an approximation -- the same trade-off the block caches in this
    /// corpus make.
    pub fn new(capacity_bytes: usize, block_size: usize) -> Self {
        let entries = (capacity_bytes / block_size.max(1)).max(16);
        let cap = NonZeroUsize::new(entries).unwrap();
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Returns the cached, decoded block for `(sst_id, block_offset)`,
    /// invoking `load` (a positional file read) and decoding on miss.
    pub fn get_or_load<F>(
        &self,
        sst_id: u64,
        block_offset: u64,
        load: F,
    ) -> Result<Arc<Vec<BlockEntry>>, SstableError>
    where
        F: FnOnce() -> Result<Vec<u8>, SstableError>,
    {
        let key = CacheKey {
            sst_id,
            block_offset,
        };
        if let Some(hit) = self.inner.lock().unwrap().get(&key) {
            return Ok(hit.clone());
        }
        let raw = load()?;
        let entries = Arc::new(decode_block(&raw)?);
        self.inner.lock().unwrap().put(key, entries.clone());
        Ok(entries)
    }

    /// Number of blocks currently resident.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
