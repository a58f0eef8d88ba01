//! The fixed-size footer every SST file ends with.
//!
//! Size is `4 * maxVarint64(10) + 4 reserved + 8 magic = 52` bytes, chosen so
//! the footer never needs its own length prefix -- a reader always seeks to
//! `file_len - FOOTER_SIZE` first.

use record::RecordError;

use crate::handle::{BlockHandle, PADDED_HANDLE_LEN};

/// Magic trailer identifying this storage format.
pub const MAGIC: u64 = 0xe489_f8a9_d479_536b;

pub const FOOTER_SIZE: usize = PADDED_HANDLE_LEN * 2 + 4 + 8;

#[derive(Debug, Clone, Copy)]
pub struct Footer {
    pub index_handle: BlockHandle,
    pub bloom_handle: BlockHandle,
}

impl Footer {
    pub fn encode(&self) -> [u8; FOOTER_SIZE] {
        let mut buf = [0u8; FOOTER_SIZE];
        buf[0..PADDED_HANDLE_LEN].copy_from_slice(&self.index_handle.encode_padded());
        buf[PADDED_HANDLE_LEN..PADDED_HANDLE_LEN * 2]
            .copy_from_slice(&self.bloom_handle.encode_padded());
        // buf[PADDED_HANDLE_LEN * 2 .. PADDED_HANDLE_LEN * 2 + 4] stays reserved/zero.
        buf[FOOTER_SIZE - 8..].copy_from_slice(&MAGIC.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, RecordError> {
        if buf.len() != FOOTER_SIZE {
            return Err(RecordError::Corrupt("footer has the wrong size"));
        }
        let magic = u64::from_le_bytes(buf[FOOTER_SIZE - 8..].try_into().unwrap());
        if magic != MAGIC {
            return Err(RecordError::Corrupt("footer magic mismatch"));
        }

        let mut idx_arr = [0u8; PADDED_HANDLE_LEN];
        idx_arr.copy_from_slice(&buf[0..PADDED_HANDLE_LEN]);
        let index_handle = BlockHandle::decode_padded(&idx_arr)?;

        let mut bloom_arr = [0u8; PADDED_HANDLE_LEN];
        bloom_arr.copy_from_slice(&buf[PADDED_HANDLE_LEN..PADDED_HANDLE_LEN * 2]);
        let bloom_handle = BlockHandle::decode_padded(&bloom_arr)?;

        Ok(Self {
            index_handle,
            bloom_handle,
        })
    }
}
