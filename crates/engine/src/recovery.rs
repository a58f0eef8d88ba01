//! Cold-start recovery: load the manifest, open its SSTs, then replay
//! whatever WAL records are not yet covered by them.

use std::path::Path;
use std::sync::Arc;

use manifest::Descriptor;
use memtable::Memtable;
use sstable::SstReader;

use crate::error::LsmError;

pub(crate) struct Recovered {
    pub descriptor: Descriptor,
    pub ssts: Vec<Arc<SstReader>>,
    pub active: Memtable,
    /// Sequence number the next `WalWriter::open` call should start at.
    pub next_seq: u64,
}

/// `sst_dir` holds the manifest and SST files; `wal_dir` holds WAL segments.
pub(crate) fn recover(sst_dir: &Path, wal_dir: &Path) -> Result<Recovered, LsmError> {
    let descriptor = Descriptor::load_latest(sst_dir)?;

    let mut ssts = Vec::with_capacity(descriptor.sst_metas.len());
    for meta in &descriptor.sst_metas {
        let path = sst_dir.join(&meta.filename);
        ssts.push(Arc::new(SstReader::open(&path)?));
    }

    let last_applied = descriptor.max_applied();
    let mut active = Memtable::new(last_applied);
    let mut max_seq = last_applied;

    wal::scan(wal_dir, |record| {
        if record.seq <= last_applied {
            return;
        }
        max_seq = max_seq.max(record.seq);
        active.insert(&record);
    })?;

    Ok(Recovered {
        descriptor,
        ssts,
        active,
        next_seq: max_seq + 1,
    })
}
