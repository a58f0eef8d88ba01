use std::time::Duration;

/// Tuning knobs for an [`crate::Engine`]. `cli` builds one of these from a
/// loaded `config::Config`; tests and embedders can construct it directly.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Memtable size, in bytes, that triggers a background flush to SST.
    pub flush_threshold_bytes: usize,
    /// Number of live SSTs that triggers a full compaction.
    pub compaction_trigger_ssts: usize,
    /// How often the compaction ticker checks `compaction_trigger_ssts`.
    pub compaction_interval: Duration,
    /// How often the cleanup ticker retires dominated WAL segments and
    /// orphaned SST files.
    pub cleanup_interval: Duration,
    /// Target false-positive rate for new SSTs' bloom filters.
    pub bloom_fpr: f64,
    /// WAL segment rollover threshold, in bytes.
    pub wal_segment_bytes: u64,
    /// Block cache budget, in bytes.
    pub block_cache_bytes: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            flush_threshold_bytes: 20 * 1024 * 1024,
            compaction_trigger_ssts: 8,
            compaction_interval: Duration::from_secs(10),
            cleanup_interval: Duration::from_secs(30),
            bloom_fpr: sstable::DEFAULT_BLOOM_FPR,
            wal_segment_bytes: wal::DEFAULT_SEGMENT_BYTES,
            block_cache_bytes: 1024 * 1024 * 1024,
        }
    }
}
