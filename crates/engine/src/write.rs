//! The write path: validate, fold the key, append to the WAL, apply to the
//! active memtable, then check whether a flush should be kicked off.

use std::sync::Arc;

use record::{internal_key, Op, Record};

use crate::error::LsmError;
use crate::flush;
use crate::{now_nanos, Inner, MAX_KEY_SIZE, MAX_VALUE_SIZE};

pub(crate) fn set(inner: &Arc<Inner>, db: u32, key: &[u8], value: Vec<u8>) -> Result<(), LsmError> {
    validate_key(key)?;
    if value.len() > MAX_VALUE_SIZE {
        return Err(LsmError::InvalidArgument(format!(
            "value of {} bytes exceeds the {MAX_VALUE_SIZE} byte limit",
            value.len()
        )));
    }

    let ikey = internal_key(db, key);
    let timestamp = now_nanos();
    let (seq, rx) = inner
        .wal
        .append(Op::Set, db, ikey.clone(), timestamp, value.clone())?;
    rx.recv()
        .map_err(|_| LsmError::Internal("wal writer dropped the completion channel".into()))??;

    {
        let mut state = inner.state.write().unwrap();
        state
            .active
            .insert(&Record::new_set(seq, db, ikey, value, timestamp));
    }

    flush::maybe_trigger_flush(inner)?;
    Ok(())
}

pub(crate) fn del(inner: &Arc<Inner>, db: u32, key: &[u8]) -> Result<(), LsmError> {
    validate_key(key)?;

    let ikey = internal_key(db, key);
    let timestamp = now_nanos();
    let (seq, rx) = inner
        .wal
        .append(Op::Del, db, ikey.clone(), timestamp, Vec::new())?;
    rx.recv()
        .map_err(|_| LsmError::Internal("wal writer dropped the completion channel".into()))??;

    {
        let mut state = inner.state.write().unwrap();
        state.active.insert(&Record::new_del(seq, db, ikey, timestamp));
    }

    flush::maybe_trigger_flush(inner)?;
    Ok(())
}

fn validate_key(key: &[u8]) -> Result<(), LsmError> {
    if key.is_empty() {
        return Err(LsmError::InvalidArgument("key must not be empty".into()));
    }
    if key.len() > MAX_KEY_SIZE {
        return Err(LsmError::InvalidArgument(format!(
            "key of {} bytes exceeds the {MAX_KEY_SIZE} byte limit",
            key.len()
        )));
    }
    Ok(())
}
