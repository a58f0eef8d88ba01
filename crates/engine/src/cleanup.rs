//! Background retirement of WAL segments and SST files nothing references
//! anymore.
//!
//! A WAL segment (other than the newest) is deletable once the *next*
//! segment's starting sequence number is already covered by the manifest's
//! `max_applied` -- every record in it is durable in some SST, so replaying
//! it again on recovery would be redundant. An SST file on disk that is
//! neither in the live set nor mid-compaction is an orphan: the remnant of a
//! publish that crashed after the file was written but before the manifest
//! was saved, or of a compaction's pre-rename tmp file being renamed under a
//! slightly different final name than expected. Either way it is safe to
//! remove.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::LsmError;
use crate::Inner;

const TICK_STEP: Duration = Duration::from_millis(200);

pub(crate) fn spawn_ticker(inner: Arc<Inner>, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut elapsed = Duration::ZERO;
        while !shutdown.load(Ordering::SeqCst) {
            thread::sleep(TICK_STEP);
            elapsed += TICK_STEP;
            if elapsed < inner.options.cleanup_interval {
                continue;
            }
            elapsed = Duration::ZERO;
            if let Err(e) = run_cleanup(&inner) {
                tracing::error!(?e, "background cleanup failed");
            }
        }
    })
}

fn run_cleanup(inner: &Arc<Inner>) -> Result<(), LsmError> {
    reclaim_wal_segments(inner)?;
    sweep_orphan_ssts(inner)?;
    Ok(())
}

fn reclaim_wal_segments(inner: &Arc<Inner>) -> Result<(), LsmError> {
    let max_applied = inner.state.read().unwrap().descriptor.max_applied();
    let segments = wal::list_segments(&inner.wal_dir)?;
    if segments.len() <= 1 {
        return Ok(());
    }
    // Every segment but the last is retired once the one after it starts at
    // or before max_applied -- that next segment's own first record already
    // proves everything in the one before it has been flushed.
    for pair in segments.windows(2) {
        let (_, path) = &pair[0];
        let (next_seq, _) = &pair[1];
        if *next_seq > max_applied {
            break;
        }
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(?e, path = %path.display(), "failed to remove retired wal segment");
        } else {
            tracing::debug!(path = %path.display(), "retired wal segment");
        }
    }
    Ok(())
}

fn sweep_orphan_ssts(inner: &Arc<Inner>) -> Result<(), LsmError> {
    let live: HashSet<String> = {
        let state = inner.state.read().unwrap();
        state
            .ssts
            .iter()
            .map(|s| {
                s.path()
                    .file_name()
                    .expect("sst path always has a filename")
                    .to_string_lossy()
                    .into_owned()
            })
            .chain(state.compacting.iter().cloned())
            .collect()
    };

    let entries = match std::fs::read_dir(&inner.sst_dir) {
        Ok(entries) => entries,
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".sst") || live.contains(name) {
            continue;
        }
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!(?e, path = %path.display(), "failed to remove orphan sstable");
        } else {
            tracing::debug!(path = %path.display(), "removed orphan sstable");
        }
    }
    Ok(())
}
