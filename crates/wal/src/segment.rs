//! WAL segment file naming and directory listing.
//!
//! Each segment is named `wal-<seqNo>.log`, where `seqNo` is the first
//! sequence number written into it. Listing a directory yields segments in
//! ascending numeric order (not lexical -- `wal-9.log` sorts before
//! `wal-10.log`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const PREFIX: &str = "wal-";
const SUFFIX: &str = ".log";

pub fn segment_path(dir: &Path, starting_seq: u64) -> PathBuf {
    dir.join(format!("{PREFIX}{starting_seq}{SUFFIX}"))
}

pub fn parse_segment_seq(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let stripped = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    stripped.parse::<u64>().ok()
}

/// Lists `wal-*.log` files in `dir`, sorted ascending by starting sequence
/// number. Returns an empty list if `dir` does not exist yet.
pub fn list_segments(dir: &Path) -> io::Result<Vec<(u64, PathBuf)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if let Some(seq) = parse_segment_seq(&path) {
            segments.push((seq, path));
        }
    }
    segments.sort_by_key(|(seq, _)| *seq);
    Ok(segments)
}
