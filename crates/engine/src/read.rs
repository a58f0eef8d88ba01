//! The read path: point lookups and bounded scans.
//!
//! A lookup checks the active memtable, then the immutable memtable (if a
//! flush is in flight), then the live SSTs newest-first, stopping at the
//! first hit. A scan merges all three sources and resolves duplicates by
//! sequence number, since a newer layer's tombstone must shadow an older
//! layer's live value for the same key.

use std::collections::BTreeMap;

use record::internal_key;

use crate::error::LsmError;
use crate::Inner;

/// Inclusive lower bound, exclusive upper bound (`None` = unbounded) for a
/// scan restricted to database `db`.
fn scan_bounds(db: u32, start: &[u8], end: &[u8]) -> (Vec<u8>, Option<Vec<u8>>) {
    let lower = internal_key(db, start);
    let upper = if !end.is_empty() {
        Some(internal_key(db, end))
    } else if db == u32::MAX {
        None
    } else {
        Some(internal_key(db + 1, b""))
    };
    (lower, upper)
}

pub(crate) fn get(inner: &Inner, db: u32, key: &[u8]) -> Result<Option<Vec<u8>>, LsmError> {
    let ikey = internal_key(db, key);

    let (immutable, ssts) = {
        let state = inner.state.read().unwrap();
        if let Some(entry) = state.active.get_entry(&ikey) {
            return Ok(entry.value.clone());
        }
        let immutable = state.immutable.clone();
        let ssts = state.ssts.clone();
        (immutable, ssts)
    };

    if let Some(mem) = immutable {
        if let Some(entry) = mem.get_entry(&ikey) {
            return Ok(entry.value.clone());
        }
    }

    for sst in &ssts {
        if let Some(entry) = sst.get(&ikey, &inner.cache)? {
            return Ok(entry.value);
        }
    }

    Ok(None)
}

pub(crate) fn scan(
    inner: &Inner,
    db: u32,
    start: &[u8],
    end: &[u8],
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LsmError> {
    let (lower, upper) = scan_bounds(db, start, end);
    let in_range = |k: &[u8]| k >= lower.as_slice() && upper.as_deref().map_or(true, |u| k < u);

    // (seq, Some(value)) for live entries, (seq, None) for tombstones -- kept
    // so a newer tombstone can shadow an older live value across sources.
    let mut merged: BTreeMap<Vec<u8>, (u64, Option<Vec<u8>>)> = BTreeMap::new();
    let mut merge = |key: Vec<u8>, seq: u64, value: Option<Vec<u8>>| match merged.get(&key) {
        Some((existing_seq, _)) if *existing_seq >= seq => {}
        _ => {
            merged.insert(key, (seq, value));
        }
    };

    let (immutable, ssts) = {
        let state = inner.state.read().unwrap();
        for (key, entry) in state.active.iter() {
            if in_range(key) {
                merge(key.to_vec(), entry.seq, entry.value.clone());
            }
        }
        (state.immutable.clone(), state.ssts.clone())
    };

    if let Some(mem) = &immutable {
        for (key, entry) in mem.iter() {
            if in_range(key) {
                merge(key.to_vec(), entry.seq, entry.value.clone());
            }
        }
    }

    for sst in &ssts {
        for entry in sst.iter_all()? {
            if in_range(&entry.key) {
                // SSTs carry no sequence number directly, but their entries
                // were themselves merged by sequence at write time, so a
                // more recent reader (memtable, newer SST) always wins ties
                // via the `>=` check above -- use 0 as the floor.
                merge(entry.key.clone(), 0, entry.value);
            }
        }
    }

    let results = merged
        .into_iter()
        .filter_map(|(mut key, (_, value))| value.map(|v| (key.split_off(4), v)))
        .collect();
    Ok(results)
}
