//! The index block: one `(first_key, block handle)` entry per data block,
//! enabling a binary search straight to the candidate block during point
//! lookups.

use record::varint::{read_uvarint, write_uvarint};
use record::RecordError;

use crate::block::{unwrap_with_crc, wrap_with_crc};
use crate::handle::BlockHandle;

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub first_key: Vec<u8>,
    pub handle: BlockHandle,
}

pub fn encode_index(entries: &[IndexEntry]) -> Vec<u8> {
    let mut buf = Vec::new();
    for e in entries {
        write_uvarint(&mut buf, e.first_key.len() as u64).unwrap();
        buf.extend_from_slice(&e.first_key);
        e.handle.encode_to(&mut buf).unwrap();
    }
    wrap_with_crc(buf)
}

pub fn decode_index(raw: &[u8]) -> Result<Vec<IndexEntry>, RecordError> {
    let body = unwrap_with_crc(raw)?;
    let mut cur: &[u8] = &body;
    let mut entries = Vec::new();

    while !cur.is_empty() {
        let key_len = read_uvarint(&mut cur)? as usize;
        if key_len > cur.len() {
            return Err(RecordError::Corrupt(
                "index entry key length overruns index block",
            ));
        }
        let first_key = cur[..key_len].to_vec();
        cur = &cur[key_len..];
        let handle = BlockHandle::decode_from(&mut cur)?;
        entries.push(IndexEntry { first_key, handle });
    }

    Ok(entries)
}
