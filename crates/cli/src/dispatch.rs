//! Command dispatch table: turns a parsed [`Command`] into an engine call
//! and a [`Reply`]. Argument-count and type errors become `-ERR` replies;
//! they never panic the connection thread.

use engine::Engine;
use protocol::{Command, Reply};

/// Per-connection state. Just the selected database today.
#[derive(Debug, Default)]
pub struct ConnState {
    pub selected_db: u32,
}

pub fn dispatch(command: &Command, engine: &Engine, state: &mut ConnState, db_max_num: u32) -> Reply {
    match command.name.as_str() {
        "ping" => Reply::Simple("PONG".to_string()),
        "select" => select(command, state, db_max_num),
        "get" => get(command, engine, state.selected_db),
        "set" => set(command, engine, state.selected_db),
        "del" => del(command, engine, state.selected_db),
        "flushdb" => flushdb(command, engine, state.selected_db),
        "quit" => Reply::Simple("OK".to_string()),
        "command" => Reply::Simple("Welcome to the server".to_string()),
        "config" => Reply::Bulk(Some(Vec::new())),
        "" => Reply::Error("ERR empty command".to_string()),
        other => Reply::Error(format!("ERR unknown command '{other}'")),
    }
}

fn select(command: &Command, state: &mut ConnState, db_max_num: u32) -> Reply {
    if command.args.len() != 1 {
        return Reply::Error("ERR wrong number of arguments for 'select' command".to_string());
    }
    let n: i64 = match std::str::from_utf8(&command.args[0]).ok().and_then(|s| s.parse().ok()) {
        Some(n) => n,
        None => return Reply::Error("ERR value is not an integer or out of range".to_string()),
    };
    if n < 0 || n as u64 >= db_max_num as u64 {
        return Reply::Error("ERR DB index is out of range".to_string());
    }
    state.selected_db = n as u32;
    Reply::Simple("OK".to_string())
}

fn get(command: &Command, engine: &Engine, db: u32) -> Reply {
    if command.args.len() != 1 {
        return Reply::Error("ERR wrong number of arguments for 'get' command".to_string());
    }
    match engine.get(db, &command.args[0]) {
        Ok(value) => Reply::Bulk(value),
        Err(e) => Reply::Error(format!("ERR {e}")),
    }
}

fn set(command: &Command, engine: &Engine, db: u32) -> Reply {
    if command.args.len() != 2 {
        return Reply::Error("ERR wrong number of arguments for 'set' command".to_string());
    }
    match engine.set(db, &command.args[0], command.args[1].clone()) {
        Ok(()) => Reply::Simple("OK".to_string()),
        Err(e) => Reply::Error(format!("ERR {e}")),
    }
}

fn del(command: &Command, engine: &Engine, db: u32) -> Reply {
    if command.args.is_empty() {
        return Reply::Error("ERR wrong number of arguments for 'del' command".to_string());
    }
    let mut deleted = 0i64;
    for key in &command.args {
        match engine.get(db, key) {
            Ok(Some(_)) => {
                if let Err(e) = engine.del(db, key) {
                    return Reply::Error(format!("ERR {e}"));
                }
                deleted += 1;
            }
            Ok(None) => {}
            Err(e) => return Reply::Error(format!("ERR {e}")),
        }
    }
    Reply::Integer(deleted)
}

fn flushdb(command: &Command, engine: &Engine, db: u32) -> Reply {
    if !command.args.is_empty() {
        return Reply::Error("ERR wrong number of arguments for 'flushdb' command".to_string());
    }
    let live = match engine.scan(db, b"", b"") {
        Ok(entries) => entries,
        Err(e) => return Reply::Error(format!("ERR {e}")),
    };
    for (key, _) in live {
        if let Err(e) = engine.del(db, &key) {
            return Reply::Error(format!("ERR {e}"));
        }
    }
    Reply::Simple("OK".to_string())
}
