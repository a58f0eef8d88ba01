//! The mutation record shared by the WAL and replayed during recovery.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::RecordError;

/// The kind of mutation a [`Record`] represents. `Get` is never logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Set = 1,
    Del = 2,
}

impl Op {
    fn from_u8(b: u8) -> Result<Self, RecordError> {
        match b {
            1 => Ok(Op::Set),
            2 => Ok(Op::Del),
            _ => Err(RecordError::Corrupt("unknown op code")),
        }
    }
}

/// A single durable mutation: who wrote it (sequence number), which database
/// and key it targets, when it happened (wall-clock timestamp), and its
/// payload. `Del` records carry an empty `value` — `Op` distinguishes a
/// tombstone from a legitimate empty value, so the two are never conflated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub seq: u64,
    pub op: Op,
    pub db: u32,
    pub key: Vec<u8>,
    pub timestamp: i64,
    pub value: Vec<u8>,
}

impl Record {
    pub fn new_set(seq: u64, db: u32, key: Vec<u8>, value: Vec<u8>, timestamp: i64) -> Self {
        Self {
            seq,
            op: Op::Set,
            db,
            key,
            timestamp,
            value,
        }
    }

    pub fn new_del(seq: u64, db: u32, key: Vec<u8>, timestamp: i64) -> Self {
        Self {
            seq,
            op: Op::Del,
            db,
            key,
            timestamp,
            value: Vec::new(),
        }
    }

    /// Encodes the record body (the part the WAL/manifest CRC frame wraps).
    ///
    /// Layout: `seq(u64) db(u32) op(u8) timestamp(i64) key_len(u32) key
    /// val_len(u32) value`, all integers little-endian.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(8 + 4 + 1 + 8 + 4 + self.key.len() + 4 + self.value.len());
        buf.write_u64::<LittleEndian>(self.seq).unwrap();
        buf.write_u32::<LittleEndian>(self.db).unwrap();
        buf.write_u8(self.op as u8).unwrap();
        buf.write_i64::<LittleEndian>(self.timestamp).unwrap();
        buf.write_u32::<LittleEndian>(self.key.len() as u32).unwrap();
        buf.extend_from_slice(&self.key);
        buf.write_u32::<LittleEndian>(self.value.len() as u32)
            .unwrap();
        buf.extend_from_slice(&self.value);
        buf
    }

    pub fn decode(mut body: &[u8]) -> Result<Self, RecordError> {
        let seq = body.read_u64::<LittleEndian>().map_err(RecordError::Io)?;
        let db = body.read_u32::<LittleEndian>().map_err(RecordError::Io)?;
        let op = Op::from_u8(body.read_u8().map_err(RecordError::Io)?)?;
        let timestamp = body.read_i64::<LittleEndian>().map_err(RecordError::Io)?;

        let key_len = body.read_u32::<LittleEndian>().map_err(RecordError::Io)? as usize;
        if key_len > body.len() {
            return Err(RecordError::Corrupt("key length exceeds record body"));
        }
        let mut key = vec![0u8; key_len];
        body.read_exact(&mut key).map_err(RecordError::Io)?;

        let val_len = body.read_u32::<LittleEndian>().map_err(RecordError::Io)? as usize;
        if val_len > body.len() {
            return Err(RecordError::Corrupt("value length exceeds record body"));
        }
        let mut value = vec![0u8; val_len];
        body.read_exact(&mut value).map_err(RecordError::Io)?;

        Ok(Self {
            seq,
            op,
            db,
            key,
            timestamp,
            value,
        })
    }
}
