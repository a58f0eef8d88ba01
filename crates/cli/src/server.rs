//! TCP accept loop: one OS thread per connection, mirroring the original
//! server's goroutine-per-connection model.

use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use engine::Engine;
use protocol::{parse_command, write_reply, Reply};

use crate::dispatch::{self, ConnState};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Binds `host:port` and serves connections until `shutdown` is set. On
/// shutdown, stops accepting new connections and waits for every
/// in-flight connection thread to finish its current request loop.
pub fn run(
    host: &str,
    port: u16,
    engine: Arc<Engine>,
    db_max_num: u32,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    let listener = TcpListener::bind((host, port)).with_context(|| format!("binding {host}:{port}"))?;
    listener.set_nonblocking(true).context("setting listener nonblocking")?;

    let mut handles: Vec<JoinHandle<()>> = Vec::new();
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                tracing::info!(%addr, "client connected");
                handles.retain(|h| !h.is_finished());
                let engine = Arc::clone(&engine);
                handles.push(thread::spawn(move || {
                    if let Err(e) = serve_client(stream, &engine, db_max_num) {
                        tracing::warn!(error = %e, "connection ended with an error");
                    }
                }));
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => return Err(e).context("accepting connection"),
        }
    }

    tracing::info!(pending = handles.len(), "shutting down: draining in-flight connections");
    for handle in handles {
        let _ = handle.join();
    }
    Ok(())
}

fn serve_client(stream: TcpStream, engine: &Engine, db_max_num: u32) -> Result<()> {
    let peer = stream.peer_addr().ok();
    stream.set_nonblocking(false).context("setting connection blocking")?;
    let mut reader = BufReader::new(stream.try_clone().context("cloning connection for reading")?);
    let mut writer = BufWriter::new(stream);
    let mut state = ConnState::default();

    loop {
        let command = match parse_command(&mut reader) {
            Ok(Some(command)) => command,
            Ok(None) => break,
            Err(e) => {
                let _ = write_reply(&mut writer, &Reply::Error(format!("ERR protocol error: {e}")));
                let _ = writer.flush();
                return Err(e.into());
            }
        };

        let quit = command.name == "quit";
        let reply = dispatch::dispatch(&command, engine, &mut state, db_max_num);
        write_reply(&mut writer, &reply)?;
        writer.flush()?;

        if quit {
            break;
        }
    }

    tracing::info!(?peer, "client disconnected");
    Ok(())
}
