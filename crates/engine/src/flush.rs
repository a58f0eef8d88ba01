//! Memtable-to-SST flush.
//!
//! Triggered automatically once the active memtable crosses
//! [`EngineOptions::flush_threshold_bytes`], and run once more on shutdown so
//! nothing durable-but-unflushed is lost. At most one flush runs at a time,
//! guarded by `Inner::flushing`; a second trigger while one is in flight is a
//! silent no-op rather than an error, since the in-flight flush will pick up
//! anything written since it started on its *next* run.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use manifest::SstMeta;
use memtable::Memtable;
use sstable::SstReader;

use crate::error::LsmError;
use crate::{now_nanos, Inner};

/// Checks the active memtable's size and, if it is over threshold and no
/// flush is already running, spawns one on a background thread.
pub(crate) fn maybe_trigger_flush(inner: &Arc<Inner>) -> Result<Option<JoinHandle<()>>, LsmError> {
    let over_threshold = {
        let state = inner.state.read().unwrap();
        state.active.size_bytes() >= inner.options.flush_threshold_bytes && state.immutable.is_none()
    };
    if !over_threshold {
        return Ok(None);
    }
    if inner
        .flushing
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(None);
    }

    let inner = Arc::clone(inner);
    Ok(Some(thread::spawn(move || {
        if let Err(e) = run_flush(&inner) {
            tracing::error!(?e, "background flush failed");
        }
        inner.flushing.store(false, Ordering::SeqCst);
    })))
}

/// Runs a flush synchronously on the calling thread and blocks until done.
/// Used on engine shutdown, where there is no point spawning a thread just to
/// immediately join it.
pub(crate) fn force_flush_blocking(inner: &Arc<Inner>) -> Result<(), LsmError> {
    let empty = {
        let state = inner.state.read().unwrap();
        state.active.is_empty() && state.immutable.is_none()
    };
    if empty {
        return Ok(());
    }
    while inner
        .flushing
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        thread::yield_now();
    }
    let result = run_flush(inner);
    inner.flushing.store(false, Ordering::SeqCst);
    result
}

fn run_flush(inner: &Arc<Inner>) -> Result<(), LsmError> {
    let immutable = {
        let mut state = inner.state.write().unwrap();
        if state.immutable.is_none() {
            if state.active.is_empty() {
                return Ok(());
            }
            let sealed = std::mem::replace(&mut state.active, Memtable::new(state.active.sequence_upper()));
            state.immutable = Some(Arc::new(sealed));
        }
        Arc::clone(state.immutable.as_ref().unwrap())
    };

    let filename = format!("{:020}.sst", now_nanos());
    let path = inner.sst_dir.join(&filename);
    sstable::write_from_memtable(&path, &immutable, inner.options.bloom_fpr)?;
    let reader = Arc::new(SstReader::open(&path)?);

    {
        let mut state = inner.state.write().unwrap();
        state.ssts.insert(0, reader);
        state.descriptor.sst_metas.insert(
            0,
            SstMeta {
                filename,
                applied_until: immutable.sequence_upper(),
            },
        );
        state.descriptor.save(&inner.sst_dir)?;
        state.immutable = None;
    }

    tracing::info!(sstable_count = inner.state.read().unwrap().ssts.len(), "flushed memtable");
    Ok(())
}
