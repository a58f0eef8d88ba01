//! Full-set compaction: once the live SST count crosses
//! [`EngineOptions::compaction_trigger_ssts`], merge every live SST into one.
//!
//! Compaction always operates over the *entire* live set rather than a
//! subset. That is what makes dropping tombstones during the merge safe: no
//! SST is left outside the compaction that could still need a deleted key's
//! shadow, and the memtable can never hold data older than anything already
//! flushed, so it poses no risk either. The tradeoff is write amplification
//! proportional to total data size rather than one level's worth -- acceptable
//! at the scale this engine targets.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use manifest::SstMeta;
use sstable::{MergeIterator, SstReader, SstWriter};

use crate::error::LsmError;
use crate::{now_nanos, Inner};

const TICK_STEP: Duration = Duration::from_millis(200);

pub(crate) fn spawn_ticker(inner: Arc<Inner>, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut elapsed = Duration::ZERO;
        while !shutdown.load(Ordering::SeqCst) {
            thread::sleep(TICK_STEP);
            elapsed += TICK_STEP;
            if elapsed < inner.options.compaction_interval {
                continue;
            }
            elapsed = Duration::ZERO;
            if let Err(e) = maybe_compact(&inner) {
                tracing::error!(?e, "background compaction failed");
            }
        }
    })
}

fn maybe_compact(inner: &Arc<Inner>) -> Result<(), LsmError> {
    let should = {
        let state = inner.state.read().unwrap();
        state.ssts.len() >= inner.options.compaction_trigger_ssts
    };
    if !should {
        return Ok(());
    }
    run_compaction(inner)
}

/// Runs a compaction unconditionally, even below the trigger threshold.
/// Used by tests and anything else that needs a deterministic merge point.
pub(crate) fn force_compact_blocking(inner: &Arc<Inner>) -> Result<(), LsmError> {
    run_compaction(inner)
}

fn run_compaction(inner: &Arc<Inner>) -> Result<(), LsmError> {
    if inner
        .compacting_now
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(());
    }
    let result = do_compaction(inner);
    inner.compacting_now.store(false, Ordering::SeqCst);
    result
}

fn sst_filename(sst: &SstReader) -> String {
    sst.path()
        .file_name()
        .expect("sst path always has a filename")
        .to_string_lossy()
        .into_owned()
}

fn do_compaction(inner: &Arc<Inner>) -> Result<(), LsmError> {
    let (ssts, applied_until, filenames) = {
        let mut state = inner.state.write().unwrap();
        if state.ssts.is_empty() {
            return Ok(());
        }
        let ssts = state.ssts.clone();
        let filenames: Vec<String> = ssts.iter().map(|s| sst_filename(s)).collect();
        for f in &filenames {
            state.compacting.insert(f.clone());
        }
        (ssts, state.descriptor.max_applied(), filenames)
    };

    match merge_into_new_sst(inner, &ssts, applied_until) {
        Ok(new_meta) => {
            publish(inner, &filenames, new_meta)?;
            for f in &filenames {
                let _ = std::fs::remove_file(inner.sst_dir.join(f));
            }
            Ok(())
        }
        Err(e) => {
            let mut state = inner.state.write().unwrap();
            for f in &filenames {
                state.compacting.remove(f);
            }
            Err(e)
        }
    }
}

fn merge_into_new_sst(
    inner: &Arc<Inner>,
    ssts: &[Arc<SstReader>],
    applied_until: u64,
) -> Result<SstMeta, LsmError> {
    // `MergeIterator` wants its sources oldest-first; `ssts` is newest-first.
    let mut sources = Vec::with_capacity(ssts.len());
    for sst in ssts.iter().rev() {
        sources.push(sst.iter_all()?);
    }
    let expected_keys: usize = sources.iter().map(|s| s.len()).sum();

    let filename = format!("{:020}.sst", now_nanos());
    let path = inner.sst_dir.join(&filename);

    let mut writer = SstWriter::create(&path, expected_keys, inner.options.bloom_fpr)?;
    for entry in MergeIterator::new(sources) {
        // The compaction always spans every live SST, so a tombstone here
        // can never still be shadowing a value left behind in an SST outside
        // this merge -- drop it instead of carrying it forward forever.
        if let Some(value) = entry.value {
            writer.append(&entry.key, entry.timestamp, Some(&value))?;
        }
    }
    writer.finish()?;

    Ok(SstMeta {
        filename,
        applied_until,
    })
}

fn publish(inner: &Arc<Inner>, compacted_filenames: &[String], new_meta: SstMeta) -> Result<(), LsmError> {
    let reader = Arc::new(SstReader::open(inner.sst_dir.join(&new_meta.filename))?);
    let compacted: HashSet<&str> = compacted_filenames.iter().map(|s| s.as_str()).collect();

    let mut state = inner.state.write().unwrap();
    state.ssts.retain(|s| !compacted.contains(sst_filename(s).as_str()));
    state.ssts.push(reader);
    state
        .descriptor
        .sst_metas
        .retain(|m| !compacted.contains(m.filename.as_str()));
    state.descriptor.sst_metas.push(new_meta);
    state.descriptor.save(&inner.sst_dir)?;
    for f in compacted_filenames {
        state.compacting.remove(f);
    }
    tracing::info!(merged = compacted_filenames.len(), "compacted sstables");
    Ok(())
}
