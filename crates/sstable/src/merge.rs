//! Merges several sorted entry streams (one per input SST, newest last) into
//! a single sorted stream, resolving duplicate keys by newest-wins.
//!
//! Unlike the teacher's hand-rolled `next_entry() -> Result<Option<...>>`,
//! this implements the standard [`Iterator`] trait directly -- every source
//! is already fully decoded in memory by the time compaction runs, so there
//! is no fallible I/O left on the hot path and a plain iterator is the
//! natural fit.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::block::BlockEntry;

/// One fully-merged, deduplicated entry ready to be written to a new SST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEntry {
    pub key: Vec<u8>,
    pub timestamp: i64,
    pub value: Option<Vec<u8>>,
}

struct HeapItem {
    key: Vec<u8>,
    timestamp: i64,
    value: Option<Vec<u8>>,
    /// Index into `iters`; higher means the entry came from a newer source.
    source: usize,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse the key ordering so the
        // smallest key sorts first. On equal keys, the entry with the
        // highest timestamp wins; remaining ties prefer the higher
        // `source` index (the newer input).
        other
            .key
            .cmp(&self.key)
            .then_with(|| self.timestamp.cmp(&other.timestamp))
            .then_with(|| self.source.cmp(&other.source))
    }
}

/// K-way merges sorted entry lists. Sources must be passed oldest-first;
/// when the same key appears in multiple sources, the one from the
/// highest-indexed source wins.
pub struct MergeIterator {
    heap: BinaryHeap<HeapItem>,
    iters: Vec<std::vec::IntoIter<BlockEntry>>,
}

impl MergeIterator {
    pub fn new(sources: Vec<Vec<BlockEntry>>) -> Self {
        let mut iters: Vec<std::vec::IntoIter<BlockEntry>> =
            sources.into_iter().map(|v| v.into_iter()).collect();
        let mut heap = BinaryHeap::new();
        for (i, it) in iters.iter_mut().enumerate() {
            if let Some(e) = it.next() {
                heap.push(HeapItem {
                    key: e.key,
                    timestamp: e.timestamp,
                    value: e.value,
                    source: i,
                });
            }
        }
        Self { heap, iters }
    }
}

impl Iterator for MergeIterator {
    type Item = MergedEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let top = self.heap.pop()?;
        if let Some(next) = self.iters[top.source].next() {
            self.heap.push(HeapItem {
                key: next.key,
                timestamp: next.timestamp,
                value: next.value,
                source: top.source,
            });
        }

        let mut best = top;
        while let Some(peek) = self.heap.peek() {
            if peek.key != best.key {
                break;
            }
            let dup = self.heap.pop().unwrap();
            if let Some(next) = self.iters[dup.source].next() {
                self.heap.push(HeapItem {
                    key: next.key,
                    timestamp: next.timestamp,
                    value: next.value,
                    source: dup.source,
                });
            }
            if (dup.timestamp, dup.source) > (best.timestamp, best.source) {
                best = dup;
            }
        }

        Some(MergedEntry {
            key: best.key,
            timestamp: best.timestamp,
            value: best.value,
        })
    }
}

#[cfg(test)]
mod tests;
