//! # manifest — the engine's descriptor of live SSTs
//!
//! A single authoritative, versioned snapshot of which SST files currently
//! make up the database. Persisted as `MANIFEST-<version>`, framed with the
//! same length+CRC32 primitive the WAL uses (see [`record::frame`]). The
//! highest-numbered `MANIFEST-*` file on disk is authoritative at startup;
//! [`Descriptor::save`] only removes the previous version file once the new
//! one has been fsynced, so a crash mid-rotation never leaves the database
//! without a valid manifest.

mod error;

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use record::{read_frame, write_frame};

pub use error::ManifestError;

const PREFIX: &str = "MANIFEST-";

/// One live SST's metadata as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SstMeta {
    pub filename: String,
    /// Highest sequence number contained in this SST.
    pub applied_until: u64,
}

/// The live set of SSTs plus a monotone version counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub sst_metas: Vec<SstMeta>,
    pub version: u64,
}

impl Descriptor {
    /// Returns the max `applied_until` across all entries, or 0 if empty —
    /// the sequence number the WAL may safely start replay after.
    pub fn max_applied(&self) -> u64 {
        self.sst_metas.iter().map(|m| m.applied_until).max().unwrap_or(0)
    }

    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u64::<LittleEndian>(self.version).unwrap();
        buf.write_u32::<LittleEndian>(self.sst_metas.len() as u32)
            .unwrap();
        for meta in &self.sst_metas {
            let name_bytes = meta.filename.as_bytes();
            buf.write_u32::<LittleEndian>(name_bytes.len() as u32)
                .unwrap();
            buf.extend_from_slice(name_bytes);
            buf.write_u64::<LittleEndian>(meta.applied_until).unwrap();
        }
        buf
    }

    fn decode(mut body: &[u8]) -> Result<Self, ManifestError> {
        let version = body
            .read_u64::<LittleEndian>()
            .map_err(ManifestError::Io)?;
        let count = body
            .read_u32::<LittleEndian>()
            .map_err(ManifestError::Io)? as usize;

        let mut sst_metas = Vec::with_capacity(count);
        for _ in 0..count {
            let name_len = body
                .read_u32::<LittleEndian>()
                .map_err(ManifestError::Io)? as usize;
            if name_len > body.len() {
                return Err(ManifestError::Corrupt("sst filename length overruns manifest body"));
            }
            let mut name_buf = vec![0u8; name_len];
            body.read_exact(&mut name_buf).map_err(ManifestError::Io)?;
            let filename = String::from_utf8(name_buf)
                .map_err(|_| ManifestError::Corrupt("sst filename is not valid utf-8"))?;
            let applied_until = body
                .read_u64::<LittleEndian>()
                .map_err(ManifestError::Io)?;
            sst_metas.push(SstMeta {
                filename,
                applied_until,
            });
        }

        Ok(Self { sst_metas, version })
    }

    /// Loads the highest-versioned `MANIFEST-*` file in `dir`, or a fresh,
    /// empty descriptor (version 0) if none exists yet.
    pub fn load_latest(dir: &Path) -> Result<Self, ManifestError> {
        let latest = latest_manifest_path(dir)?;
        let Some(path) = latest else {
            return Ok(Self {
                sst_metas: Vec::new(),
                version: 0,
            });
        };

        let mut file = File::open(&path)?;
        let body = read_frame(&mut file)?
            .ok_or(ManifestError::Corrupt("manifest file is empty or truncated"))?;
        Self::decode(&body)
    }

    /// Persists the descriptor as `MANIFEST-<version+1>`: write a temp file,
    /// fsync, atomically rename into place, fsync the directory, then only
    /// now remove the previous version's file.
    pub fn save(&mut self, dir: &Path) -> Result<(), ManifestError> {
        fs::create_dir_all(dir)?;
        let prior_version = self.version;
        let new_version = prior_version + 1;

        let payload = {
            let staged = Self {
                sst_metas: self.sst_metas.clone(),
                version: new_version,
            };
            staged.encode()
        };

        let final_path = dir.join(format!("{PREFIX}{new_version}"));
        let tmp_path = dir.join(format!("{PREFIX}{new_version}.tmp"));

        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            write_frame(&mut tmp, &payload)?;
            tmp.flush()?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &final_path)?;
        if let Ok(dir_handle) = File::open(dir) {
            let _ = dir_handle.sync_all();
        }

        if prior_version > 0 {
            let prior_path = dir.join(format!("{PREFIX}{prior_version}"));
            if let Err(e) = fs::remove_file(&prior_path) {
                tracing::debug!(?e, path = %prior_path.display(), "failed to remove stale manifest version");
            }
        }

        self.version = new_version;
        tracing::debug!(version = new_version, ssts = self.sst_metas.len(), "manifest saved");
        Ok(())
    }
}

fn latest_manifest_path(dir: &Path) -> Result<Option<PathBuf>, ManifestError> {
    if !dir.exists() {
        return Ok(None);
    }
    let mut best: Option<(u64, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(suffix) = name.strip_prefix(PREFIX) else {
            continue;
        };
        if suffix.ends_with(".tmp") {
            continue;
        }
        let Ok(version) = suffix.parse::<u64>() else {
            continue;
        };
        if best.as_ref().map(|(v, _)| version > *v).unwrap_or(true) {
            best = Some((version, path));
        }
    }
    Ok(best.map(|(_, path)| path))
}

#[cfg(test)]
mod tests;
