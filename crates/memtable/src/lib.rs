//! # Memtable
//!
//! An in-memory, sorted, mutable write buffer for the storage engine.
//!
//! The memtable is the first point of contact for every write. It buffers
//! recent `Set`/`Del` mutations in a sorted structure (`BTreeMap`) before they
//! are flushed to an immutable on-disk SST.
//!
//! ## Key properties
//! - **Sorted order**: entries are always in ascending key order (required
//!   for SST flush).
//! - **Sequence-number gated**: a write whose sequence number is not strictly
//!   newer than the entry already present is silently ignored.
//! - **Tombstone support**: deletes are recorded as `MemtableEntry { value: None }`.
//! - **Sequence range**: tracks `[sequence_lower, sequence_upper]`, letting
//!   the engine prove there is no coverage gap between the memtable and the
//!   live SST set.
//! - **Size tracking**: tracks key + value bytes for flush-threshold decisions.
//!
//! ## Example
//! ```rust
//! use memtable::Memtable;
//! use record::Record;
//!
//! let mut m = Memtable::new(0);
//! m.insert(&Record::new_set(1, 0, b"hello".to_vec(), b"world".to_vec(), 0));
//! assert_eq!(m.get(b"hello").unwrap().1, b"world");
//!
//! m.insert(&Record::new_del(2, 0, b"hello".to_vec(), 0));
//! assert!(m.get(b"hello").is_none());
//! ```

use std::collections::BTreeMap;

use record::{Op, Record};

/// A single entry in the memtable.
///
/// - `value == Some(bytes)` — the key holds a live value.
/// - `value == None` — the key has been deleted (tombstone).
///
/// Tombstones are retained and flushed to SSTs so that older values in other
/// SSTs are correctly shadowed during reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemtableEntry {
    /// Sequence number of the mutation that produced this entry.
    pub seq: u64,
    /// Wall-clock timestamp recorded with the mutation.
    pub timestamp: i64,
    /// `Some(bytes)` for live values, `None` for tombstones.
    pub value: Option<Vec<u8>>,
}

/// An ordered, in-memory write buffer backed by a `BTreeMap`.
#[derive(Debug)]
pub struct Memtable {
    map: BTreeMap<Vec<u8>, MemtableEntry>,
    size_bytes: usize,
    sequence_lower: u64,
    sequence_upper: u64,
}

impl Memtable {
    /// Creates a new, empty memtable whose sequence range starts at
    /// `sequence_lower` — the highest sequence number already durable in the
    /// live SST set at construction time.
    pub fn new(sequence_lower: u64) -> Self {
        Self {
            map: BTreeMap::new(),
            size_bytes: 0,
            sequence_lower,
            sequence_upper: sequence_lower,
        }
    }

    /// Applies a mutation record to the memtable.
    ///
    /// A write whose sequence number is not strictly newer than the existing
    /// entry's is silently ignored (stale-write protection, relevant during
    /// concurrent recovery paths). `sequence_upper` still advances to
    /// `record.seq` regardless of whether the per-key write was applied.
    pub fn insert(&mut self, record: &Record) {
        match record.op {
            Op::Set => self.put(
                record.key.clone(),
                record.value.clone(),
                record.seq,
                record.timestamp,
            ),
            Op::Del => self.delete(record.key.clone(), record.seq, record.timestamp),
        }
        if record.seq > self.sequence_upper {
            self.sequence_upper = record.seq;
        }
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>, seq: u64, timestamp: i64) {
        match self.map.get(&key) {
            Some(old) if old.seq >= seq => return,
            Some(old) => {
                if let Some(ref ov) = old.value {
                    self.size_bytes = self.size_bytes.saturating_sub(ov.len());
                }
            }
            None => {
                self.size_bytes = self.size_bytes.saturating_add(key.len());
            }
        }
        self.size_bytes = self.size_bytes.saturating_add(value.len());
        self.map.insert(
            key,
            MemtableEntry {
                seq,
                timestamp,
                value: Some(value),
            },
        );
    }

    fn delete(&mut self, key: Vec<u8>, seq: u64, timestamp: i64) {
        match self.map.get(&key) {
            Some(old) if old.seq >= seq => return,
            Some(old) => {
                if let Some(ref ov) = old.value {
                    self.size_bytes = self.size_bytes.saturating_sub(ov.len());
                }
            }
            None => {
                self.size_bytes = self.size_bytes.saturating_add(key.len());
            }
        }
        self.map.insert(
            key,
            MemtableEntry {
                seq,
                timestamp,
                value: None,
            },
        );
    }

    /// Returns `(timestamp, value)` for a live key. Returns `None` for both
    /// missing keys and tombstones — use [`get_entry`](Self::get_entry) to
    /// tell those apart.
    pub fn get(&self, key: &[u8]) -> Option<(i64, &[u8])> {
        self.map
            .get(key)
            .and_then(|e| e.value.as_deref().map(|v| (e.timestamp, v)))
    }

    /// Returns the raw entry for `key`, tombstones included.
    pub fn get_entry(&self, key: &[u8]) -> Option<&MemtableEntry> {
        self.map.get(key)
    }

    /// `true` if the memtable has an entry for `key` (tombstones count).
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.map.contains_key(key)
    }

    /// Forward iterator over all entries in ascending key order, tombstones
    /// included. Required for SST flush.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &MemtableEntry)> {
        self.map.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Number of entries, including tombstones.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Approximate byte size of all keys and values (does not include
    /// `BTreeMap` node overhead). Used by the engine to decide when to flush.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Highest sequence number already durable when this memtable was created.
    pub fn sequence_lower(&self) -> u64 {
        self.sequence_lower
    }

    /// Highest sequence number applied to this memtable so far.
    pub fn sequence_upper(&self) -> u64 {
        self.sequence_upper
    }
}
