//! Layered JSON configuration for the server and storage engine.
//!
//! A config file may omit any section, and any section may omit any field;
//! both fall back to the defaults below. [`Config::load`] never panics on a
//! malformed or out-of-range file -- it returns a [`ConfigError`] instead.

mod error;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use error::ConfigError;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DbConfig {
    pub path: PathBuf,
    pub max_num: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_num: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6389,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub block_size_kib: u32,
    pub block_cache_mb: u32,
    pub memtable_flush_mb: u32,
    pub bloom_fpr: f64,
    pub compaction_trigger_ssts: u32,
    pub compaction_interval_secs: u64,
    pub cleanup_interval_secs: u64,
    pub wal_segment_mib: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            block_size_kib: 16,
            block_cache_mb: 1024,
            memtable_flush_mb: 20,
            bloom_fpr: 0.01,
            compaction_trigger_ssts: 8,
            compaction_interval_secs: 10,
            cleanup_interval_secs: 30,
            wal_segment_mib: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl Config {
    /// Loads a config from `path`, or the all-defaults config when `path`
    /// is `None`. Validates the result before returning it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Config::default(),
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Path to the directory `wal`/`sst`/manifest files live under the
    /// internal subdirectory of: `<db.path>/_internal`.
    pub fn internal_dir(&self) -> PathBuf {
        self.db.path.join("_internal")
    }

    /// Creates `db.path` and its `_internal` subdirectory if they don't
    /// already exist.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.db.path).map_err(|source| ConfigError::Io {
            path: self.db.path.display().to_string(),
            source,
        })?;
        let internal = self.internal_dir();
        fs::create_dir_all(&internal).map_err(|source| ConfigError::Io {
            path: internal.display().to_string(),
            source,
        })?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db.max_num == 0 {
            return Err(ConfigError::Invalid("db.max_num must be at least 1".to_string()));
        }
        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be between 1 and 65535".to_string()));
        }
        if self.storage.block_size_kib == 0 {
            return Err(ConfigError::Invalid("storage.block_size_kib must be at least 1".to_string()));
        }
        if self.storage.block_cache_mb == 0 {
            return Err(ConfigError::Invalid("storage.block_cache_mb must be at least 1".to_string()));
        }
        if self.storage.memtable_flush_mb == 0 {
            return Err(ConfigError::Invalid("storage.memtable_flush_mb must be at least 1".to_string()));
        }
        if !(self.storage.bloom_fpr > 0.0 && self.storage.bloom_fpr < 1.0) {
            return Err(ConfigError::Invalid("storage.bloom_fpr must be between 0 and 1".to_string()));
        }
        if self.storage.compaction_trigger_ssts < 2 {
            return Err(ConfigError::Invalid(
                "storage.compaction_trigger_ssts must be at least 2".to_string(),
            ));
        }
        if self.storage.compaction_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "storage.compaction_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.storage.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "storage.cleanup_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.storage.wal_segment_mib == 0 {
            return Err(ConfigError::Invalid("storage.wal_segment_mib must be at least 1".to_string()));
        }
        if self.log.level.is_empty() {
            return Err(ConfigError::Invalid("log.level must not be empty".to_string()));
        }
        Ok(())
    }
}

fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".gobigdis")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 6389);
        assert_eq!(config.storage.bloom_fpr, 0.01);
    }

    #[test]
    fn load_with_no_path_uses_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn missing_section_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"server": {"port": 7000}}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.db, DbConfig::default());
    }

    #[test]
    fn missing_field_within_a_present_section_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"db": {"max_num": 4}}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.db.max_num, 4);
        assert_eq!(config.db.path, DbConfig::default().path);
    }

    #[test]
    fn rejects_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(b"not json").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_missing_file() {
        let path = PathBuf::from("/nonexistent/path/config.json");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn rejects_zero_block_size() {
        let mut config = Config::default();
        config.storage.block_size_kib = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_bloom_fpr() {
        let mut config = Config::default();
        config.storage.bloom_fpr = 1.5;
        assert!(config.validate().is_err());

        config.storage.bloom_fpr = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_db_max_num() {
        let mut config = Config::default();
        config.db.max_num = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn ensure_dirs_creates_internal_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db: DbConfig {
                path: dir.path().join("data"),
                ..DbConfig::default()
            },
            ..Config::default()
        };

        config.ensure_dirs().unwrap();
        assert!(config.db.path.is_dir());
        assert!(config.internal_dir().is_dir());
        assert_eq!(config.internal_dir(), dir.path().join("data").join("_internal"));
    }
}
