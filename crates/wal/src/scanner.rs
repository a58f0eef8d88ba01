//! WAL replay: iterates every record across all segments in a directory, in
//! ascending segment and in-segment order.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use record::{read_frame, Record};

use crate::error::WalError;
use crate::segment::list_segments;

/// Replays every record across `wal-*.log` files in `dir`, calling `apply`
/// for each one in order. A truncated tail frame (a crash mid-write) is
/// treated as clean end of log; a CRC mismatch is fatal and stops the scan.
pub fn scan<F>(dir: &Path, mut apply: F) -> Result<(), WalError>
where
    F: FnMut(Record),
{
    for (_, path) in list_segments(dir)? {
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);
        loop {
            match read_frame(&mut reader)? {
                None => break,
                Some(body) => apply(Record::decode(&body)?),
            }
        }
    }
    Ok(())
}

/// Convenience wrapper over [`scan`] that collects every record into a
/// `Vec`, in order.
pub fn scan_all(dir: &Path) -> Result<Vec<Record>, WalError> {
    let mut records = Vec::new();
    scan(dir, |r| records.push(r))?;
    Ok(records)
}
