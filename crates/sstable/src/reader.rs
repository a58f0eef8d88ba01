//! Reads an immutable SST file for point lookups and full scans.
//!
//! On [`open`](SstReader::open) the index block and bloom filter are loaded
//! into memory; data blocks are loaded lazily through the shared
//! [`BlockCache`] and stay resident only as long as the cache keeps them.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bloom::BloomFilter;

use crate::block::BlockEntry;
use crate::cache::{next_sst_id, BlockCache};
use crate::footer::{Footer, FOOTER_SIZE};
use crate::handle::BlockHandle;
use crate::index::{decode_index, IndexEntry};
use crate::SstableError;

pub struct SstReader {
    id: u64,
    path: PathBuf,
    file: Mutex<File>,
    index: Vec<IndexEntry>,
    bloom: BloomFilter,
}

impl SstReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SstableError> {
        let path_buf = path.as_ref().to_path_buf();
        let mut file = File::open(&path_buf)?;
        let file_len = file.metadata()?.len();
        if file_len < FOOTER_SIZE as u64 {
            return Err(SstableError::Corrupt("sst file shorter than its footer"));
        }

        let mut footer_buf = [0u8; FOOTER_SIZE];
        file.seek(SeekFrom::Start(file_len - FOOTER_SIZE as u64))?;
        file.read_exact(&mut footer_buf)?;
        let footer = Footer::decode(&footer_buf)?;

        let index_raw = read_block_raw(&mut file, footer.index_handle)?;
        let index = decode_index(&index_raw)?;

        let bloom_raw = read_block_raw(&mut file, footer.bloom_handle)?;
        let bloom_body = crate::block::unwrap_with_crc(&bloom_raw)?;
        let bloom = BloomFilter::read_from(&mut bloom_body.as_slice())?;

        Ok(Self {
            id: next_sst_id(),
            path: path_buf,
            file: Mutex::new(file),
            index,
            bloom,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up `key`, consulting the bloom filter before touching the index
    /// or cache. Returns the newest entry for `key` in this file, if present.
    pub fn get(&self, key: &[u8], cache: &BlockCache) -> Result<Option<BlockEntry>, SstableError> {
        if !self.bloom.may_contain(key) {
            return Ok(None);
        }

        let handle = match self.find_block_handle(key) {
            Some(h) => h,
            None => return Ok(None),
        };

        let block = self.load_block(handle, cache)?;
        Ok(block
            .iter()
            .find(|e| e.key == key)
            .cloned())
    }

    /// Binary-searches the index for the block that could contain `key`.
    fn find_block_handle(&self, key: &[u8]) -> Option<BlockHandle> {
        if self.index.is_empty() {
            return None;
        }
        let idx = self
            .index
            .partition_point(|entry| entry.first_key.as_slice() <= key);
        if idx == 0 {
            return None;
        }
        Some(self.index[idx - 1].handle)
    }

    fn load_block(
        &self,
        handle: BlockHandle,
        cache: &BlockCache,
    ) -> Result<Arc<Vec<BlockEntry>>, SstableError> {
        let path = self.path.clone();
        cache.get_or_load(self.id, handle.offset, move || {
            let mut file = File::open(&path)?;
            read_block_raw(&mut file, handle)
        })
    }

    /// Decodes every data block in the file, in key order. Used by
    /// compaction's merge iterator, which needs a full scan rather than
    /// point lookups.
    pub fn iter_all(&self) -> Result<Vec<BlockEntry>, SstableError> {
        let mut out = Vec::new();
        let mut file = self.file.lock().unwrap();
        for entry in &self.index {
            let raw = read_block_raw(&mut file, entry.handle)?;
            out.extend(crate::block::decode_block(&raw)?);
        }
        Ok(out)
    }

    pub fn block_count(&self) -> usize {
        self.index.len()
    }
}

pub(crate) fn read_block_raw<F: Read + Seek>(
    file: &mut F,
    handle: BlockHandle,
) -> Result<Vec<u8>, SstableError> {
    file.seek(SeekFrom::Start(handle.offset))?;
    let mut buf = vec![0u8; handle.size as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}
