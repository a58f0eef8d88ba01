//! Data blocks: the unit SSTs are divided into, target size 16 KiB.
//!
//! Entry encoding (repeated until the block is finished):
//!
//! ```text
//! key_len(varint) key timestamp(i64 LE) tag(u8: 1=tombstone, 2=value) [val_len(varint) value]
//! ```
//!
//! Every block -- data, index, or bloom -- ends with a trailing CRC32 over
//! its body, via [`wrap_with_crc`]/[`unwrap_with_crc`].

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;

use record::varint::{read_uvarint, write_uvarint};
use record::RecordError;

/// Target size, in bytes, a data block is flushed at.
pub const TARGET_BLOCK_SIZE: usize = 16 * 1024;

const TAG_TOMBSTONE: u8 = 1;
const TAG_VALUE: u8 = 2;

/// One decoded entry from a data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    pub key: Vec<u8>,
    pub timestamp: i64,
    pub value: Option<Vec<u8>>,
}

/// Accumulates encoded entries for one data block.
pub struct BlockBuilder {
    buf: Vec<u8>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(TARGET_BLOCK_SIZE),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn size_estimate(&self) -> usize {
        self.buf.len()
    }

    /// Appends one entry. The caller (the SST writer) is responsible for
    /// only ever adding keys in non-decreasing order across the whole file.
    pub fn add(&mut self, key: &[u8], timestamp: i64, value: Option<&[u8]>) {
        write_uvarint(&mut self.buf, key.len() as u64).unwrap();
        self.buf.extend_from_slice(key);
        self.buf.write_i64::<LittleEndian>(timestamp).unwrap();
        match value {
            None => {
                self.buf.write_u8(TAG_TOMBSTONE).unwrap();
            }
            Some(v) => {
                self.buf.write_u8(TAG_VALUE).unwrap();
                write_uvarint(&mut self.buf, v.len() as u64).unwrap();
                self.buf.extend_from_slice(v);
            }
        }
    }

    /// Finalizes the block, returning the bytes to write to the file.
    pub fn finish(self) -> Vec<u8> {
        wrap_with_crc(self.buf)
    }
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends a trailing CRC32 over `payload` and returns the combined bytes.
pub fn wrap_with_crc(payload: Vec<u8>) -> Vec<u8> {
    let mut buf = payload;
    let mut hasher = Hasher::new();
    hasher.update(&buf);
    let crc = hasher.finalize();
    buf.write_u32::<LittleEndian>(crc).unwrap();
    buf
}

/// Verifies and strips the trailing CRC32 written by [`wrap_with_crc`].
pub fn unwrap_with_crc(raw: &[u8]) -> Result<Vec<u8>, RecordError> {
    if raw.len() < 4 {
        return Err(RecordError::Corrupt("block shorter than its checksum"));
    }
    let (body, crc_bytes) = raw.split_at(raw.len() - 4);
    let expected = u32::from_le_bytes(crc_bytes.try_into().unwrap());
    let mut hasher = Hasher::new();
    hasher.update(body);
    if hasher.finalize() != expected {
        return Err(RecordError::Corrupt("block checksum mismatch"));
    }
    Ok(body.to_vec())
}

/// Decodes a whole data block (CRC included) into its entries.
pub fn decode_block(raw: &[u8]) -> Result<Vec<BlockEntry>, RecordError> {
    let body = unwrap_with_crc(raw)?;
    let mut cur: &[u8] = &body;
    let mut entries = Vec::new();

    while !cur.is_empty() {
        let key_len = read_uvarint(&mut cur)? as usize;
        if key_len > cur.len() {
            return Err(RecordError::Corrupt("block entry key length overruns block"));
        }
        let key = cur[..key_len].to_vec();
        cur = &cur[key_len..];

        let timestamp = cur.read_i64::<LittleEndian>().map_err(RecordError::Io)?;
        let tag = cur.read_u8().map_err(RecordError::Io)?;
        let value = match tag {
            TAG_TOMBSTONE => None,
            TAG_VALUE => {
                let val_len = read_uvarint(&mut cur)? as usize;
                if val_len > cur.len() {
                    return Err(RecordError::Corrupt(
                        "block entry value length overruns block",
                    ));
                }
                let v = cur[..val_len].to_vec();
                cur = &cur[val_len..];
                Some(v)
            }
            _ => return Err(RecordError::Corrupt("unknown block entry tag")),
        };

        entries.push(BlockEntry {
            key,
            timestamp,
            value,
        });
    }

    Ok(entries)
}
