//! SST writer: buffers entries into ~16 KiB data blocks, builds the index and
//! bloom filter alongside, then atomically publishes the finished file.
//!
//! Keys must be appended in strictly non-decreasing order -- the writer is
//! always fed from something already sorted (a memtable or a merge
//! iterator), so a violation here is a programming error, not a runtime
//! condition callers need to recover from.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bloom::BloomFilter;
use memtable::Memtable;

use crate::block::{wrap_with_crc, BlockBuilder, TARGET_BLOCK_SIZE};
use crate::footer::Footer;
use crate::handle::BlockHandle;
use crate::index::{encode_index, IndexEntry};
use crate::merge::MergeIterator;

/// Default target false-positive rate for a new SST's bloom filter.
pub const DEFAULT_BLOOM_FPR: f64 = 0.01;

pub struct SstWriter {
    file: File,
    tmp_path: PathBuf,
    final_path: PathBuf,
    offset: u64,
    current: BlockBuilder,
    current_first_key: Option<Vec<u8>>,
    index: Vec<IndexEntry>,
    bloom: BloomFilter,
    last_key: Option<Vec<u8>>,
}

impl SstWriter {
    pub fn create<P: AsRef<Path>>(
        path: P,
        expected_keys: usize,
        bloom_fpr: f64,
    ) -> io::Result<Self> {
        let final_path = path.as_ref().to_path_buf();
        let tmp_path = final_path.with_extension("sst.tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        Ok(Self {
            file,
            tmp_path,
            final_path,
            offset: 0,
            current: BlockBuilder::new(),
            current_first_key: None,
            index: Vec::new(),
            bloom: BloomFilter::new(expected_keys.max(1), bloom_fpr),
            last_key: None,
        })
    }

    /// Appends one entry. `value = None` writes a tombstone.
    pub fn append(&mut self, key: &[u8], timestamp: i64, value: Option<&[u8]>) -> io::Result<()> {
        if let Some(last) = &self.last_key {
            if key < last.as_slice() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "sst writer requires non-decreasing keys",
                ));
            }
        }
        self.last_key = Some(key.to_vec());
        self.bloom.insert(key);

        if self.current_first_key.is_none() {
            self.current_first_key = Some(key.to_vec());
        }
        self.current.add(key, timestamp, value);

        if self.current.size_estimate() >= TARGET_BLOCK_SIZE {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> io::Result<()> {
        if self.current.is_empty() {
            return Ok(());
        }
        let builder = std::mem::replace(&mut self.current, BlockBuilder::new());
        let bytes = builder.finish();
        let handle = BlockHandle {
            offset: self.offset,
            size: bytes.len() as u64,
        };
        self.file.write_all(&bytes)?;
        self.offset += bytes.len() as u64;
        let first_key = self.current_first_key.take().unwrap();
        self.index.push(IndexEntry { first_key, handle });
        Ok(())
    }

    /// Finalizes the file: flushes the last partial block, writes the index,
    /// bloom filter and footer, fsyncs, and atomically renames into place.
    pub fn finish(mut self) -> io::Result<()> {
        self.flush_block()?;

        let index_bytes = encode_index(&self.index);
        let index_handle = BlockHandle {
            offset: self.offset,
            size: index_bytes.len() as u64,
        };
        self.file.write_all(&index_bytes)?;
        self.offset += index_bytes.len() as u64;

        let mut bloom_payload = Vec::new();
        self.bloom.write_to(&mut bloom_payload)?;
        let bloom_bytes = wrap_with_crc(bloom_payload);
        let bloom_handle = BlockHandle {
            offset: self.offset,
            size: bloom_bytes.len() as u64,
        };
        self.file.write_all(&bloom_bytes)?;
        self.offset += bloom_bytes.len() as u64;

        let footer = Footer {
            index_handle,
            bloom_handle,
        };
        self.file.write_all(&footer.encode())?;
        self.file.flush()?;
        self.file.sync_all()?;
        drop(self.file);

        fs::rename(&self.tmp_path, &self.final_path)?;
        if let Some(parent) = self.final_path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

/// Writes a new SST from a memtable's entries (the flush path).
pub fn write_from_memtable<P: AsRef<Path>>(
    path: P,
    mem: &Memtable,
    bloom_fpr: f64,
) -> io::Result<()> {
    let mut w = SstWriter::create(&path, mem.len().max(1), bloom_fpr)?;
    for (key, entry) in mem.iter() {
        w.append(key, entry.timestamp, entry.value.as_deref())?;
    }
    w.finish()
}

/// Writes a new SST by draining a merge iterator (the compaction path).
/// `expected_keys` only sizes the bloom filter; an undercount merely raises
/// its false-positive rate -- it never causes incorrect results.
pub fn write_from_merge<P: AsRef<Path>>(
    path: P,
    merge: MergeIterator,
    expected_keys: usize,
    bloom_fpr: f64,
) -> io::Result<()> {
    let mut w = SstWriter::create(&path, expected_keys.max(1), bloom_fpr)?;
    for entry in merge {
        w.append(&entry.key, entry.timestamp, entry.value.as_deref())?;
    }
    w.finish()
}
