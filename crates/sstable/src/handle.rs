//! Block handles: `(offset, size)` pairs pointing into an SST file.

use std::io::{self, Read, Write};

use record::varint::{read_uvarint, write_uvarint, MAX_VARINT_LEN};
use record::RecordError;

/// Fixed width a handle occupies when padded for the footer: two varints,
/// each padded out to the maximum a `u64` varint can take.
pub const PADDED_HANDLE_LEN: usize = MAX_VARINT_LEN * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    pub offset: u64,
    pub size: u64,
}

impl BlockHandle {
    pub fn encode_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_uvarint(w, self.offset)?;
        write_uvarint(w, self.size)?;
        Ok(())
    }

    pub fn decode_from<R: Read>(r: &mut R) -> Result<Self, RecordError> {
        let offset = read_uvarint(r)?;
        let size = read_uvarint(r)?;
        Ok(Self { offset, size })
    }

    /// Encodes into a fixed-size, zero-padded slot so the footer can have a
    /// constant size regardless of how small the actual offsets/sizes are.
    pub fn encode_padded(&self) -> [u8; PADDED_HANDLE_LEN] {
        let mut buf = [0u8; PADDED_HANDLE_LEN];
        let mut off_buf = Vec::new();
        write_uvarint(&mut off_buf, self.offset).unwrap();
        buf[..off_buf.len()].copy_from_slice(&off_buf);
        let mut size_buf = Vec::new();
        write_uvarint(&mut size_buf, self.size).unwrap();
        buf[MAX_VARINT_LEN..MAX_VARINT_LEN + size_buf.len()].copy_from_slice(&size_buf);
        buf
    }

    pub fn decode_padded(buf: &[u8; PADDED_HANDLE_LEN]) -> Result<Self, RecordError> {
        let mut off_cur = &buf[..MAX_VARINT_LEN];
        let offset = read_uvarint(&mut off_cur)?;
        let mut size_cur = &buf[MAX_VARINT_LEN..];
        let size = read_uvarint(&mut size_cur)?;
        Ok(Self { offset, size })
    }
}
