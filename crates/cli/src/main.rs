//! Entry point for the `server` binary.
//!
//! Flag parsing, config loading, engine construction, and the Ctrl-C
//! shutdown wiring live here; the accept loop and command dispatch are in
//! [`server`] and [`dispatch`].
//!
//! ```text
//! server [-c config.json] [-h host] [-p port] [-d db-path]
//! ```

mod dispatch;
mod server;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::Config;
use engine::{Engine, EngineOptions};

struct Args {
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    db_path: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args {
        config_path: None,
        host: None,
        port: None,
        db_path: None,
    };

    let mut it = std::env::args().skip(1);
    while let Some(flag) = it.next() {
        match flag.as_str() {
            "-c" | "--config" => args.config_path = it.next().map(PathBuf::from),
            "-h" | "--host" => args.host = it.next(),
            "-p" | "--port" => args.port = it.next().and_then(|s| s.parse().ok()),
            "-d" | "--db-path" => args.db_path = it.next().map(PathBuf::from),
            other => eprintln!("ignoring unrecognized argument: {other}"),
        }
    }
    args
}

fn engine_options(storage: &config::StorageConfig) -> EngineOptions {
    EngineOptions {
        flush_threshold_bytes: storage.memtable_flush_mb as usize * 1024 * 1024,
        compaction_trigger_ssts: storage.compaction_trigger_ssts as usize,
        compaction_interval: Duration::from_secs(storage.compaction_interval_secs),
        cleanup_interval: Duration::from_secs(storage.cleanup_interval_secs),
        bloom_fpr: storage.bloom_fpr,
        wal_segment_bytes: storage.wal_segment_mib as u64 * 1024 * 1024,
        block_cache_bytes: storage.block_cache_mb as usize * 1024 * 1024,
    }
}

fn main() -> Result<()> {
    let args = parse_args();

    let mut config = Config::load(args.config_path.as_deref()).context("loading configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(db_path) = args.db_path {
        config.db.path = db_path;
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(config.log.level.clone()))
        .init();

    config.ensure_dirs().context("preparing data directories")?;

    let options = engine_options(&config.storage);
    let engine = Arc::new(
        Engine::open(&config.internal_dir(), options).context("opening storage engine")?,
    );
    let db_max_num = config.db.max_num;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            tracing::info!("received interrupt signal, shutting down");
            shutdown.store(true, Ordering::SeqCst);
        })
        .context("installing Ctrl-C handler")?;
    }

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        db_path = %config.db.path.display(),
        "starting server"
    );
    server::run(&config.server.host, config.server.port, engine, db_max_num, shutdown)
}
