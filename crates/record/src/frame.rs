//! CRC-framed length-prefixed byte frames.
//!
//! Every on-disk frame used by the WAL and the manifest shares this layout:
//!
//! ```text
//! [len: u32 LE][crc32: u32 LE][payload: len bytes]
//! ```
//!
//! `len` is the payload length; it does not include itself or the checksum.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;
use std::io::{self, Read, Write};

use crate::RecordError;

/// Safety cap on a single frame's payload size.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// Writes `payload` as one CRC-framed frame.
pub fn write_frame<W: Write>(w: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = payload.len() as u64;
    if len > MAX_FRAME_LEN as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame payload too large: {} bytes", len),
        ));
    }
    let mut hasher = Hasher::new();
    hasher.update(payload);
    let crc = hasher.finalize();

    w.write_u32::<LittleEndian>(len as u32)?;
    w.write_u32::<LittleEndian>(crc)?;
    w.write_all(payload)?;
    Ok(())
}

/// Reads one CRC-framed frame.
///
/// Returns `Ok(None)` on a clean EOF encountered before or during the frame
/// (tolerates a crash-truncated tail). Returns `RecordError::Corrupt` if the
/// length exceeds [`MAX_FRAME_LEN`] or the CRC does not match a fully-read
/// payload.
pub fn read_frame<R: Read>(r: &mut R) -> Result<Option<Vec<u8>>, RecordError> {
    let len = match r.read_u32::<LittleEndian>() {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(RecordError::Io(e)),
    };
    if len > MAX_FRAME_LEN {
        return Err(RecordError::Corrupt("frame length exceeds safety cap"));
    }

    let crc = match r.read_u32::<LittleEndian>() {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(RecordError::Io(e)),
    };

    let mut payload = vec![0u8; len as usize];
    match r.read_exact(&mut payload) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(RecordError::Io(e)),
    }

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    if hasher.finalize() != crc {
        return Err(RecordError::Corrupt("frame CRC mismatch"));
    }

    Ok(Some(payload))
}
