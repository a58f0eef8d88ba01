//! Group-commit WAL writer.
//!
//! `append` assigns a sequence number and hands the encoded record to a
//! dedicated writer thread over a bounded queue; the caller blocks on a
//! completion channel. The writer thread drains every record queued since
//! its last pass, writes them in one batch, and resolves every completion
//! in that batch with the result of a single `flush + fsync` -- this is
//! what amortizes fsync cost across concurrent callers.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use record::{write_frame, Op, Record};

use crate::error::WalError;
use crate::segment::segment_path;

/// Rollover threshold: a segment is closed and a new one opened once it
/// would exceed this size.
pub const DEFAULT_SEGMENT_BYTES: u64 = 1024 * 1024 * 1024;
/// Records with an encoded body larger than this are rejected without ever
/// reaching the writer thread.
pub const MAX_RECORD_BYTES: usize = 100 * 1024 * 1024;
const QUEUE_CAPACITY: usize = 1024;

struct Pending {
    seq: u64,
    frame: Vec<u8>,
    completion: Sender<Result<(), WalError>>,
}

pub struct WalWriter {
    next_seq: Mutex<u64>,
    queue_tx: Mutex<Option<SyncSender<Pending>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl WalWriter {
    /// Opens a writer that starts a fresh segment named by `starting_seq`
    /// (the next sequence number to be assigned after WAL recovery).
    pub fn open<P: AsRef<Path>>(
        dir: P,
        starting_seq: u64,
        segment_bytes: u64,
    ) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let (queue_tx, queue_rx) = mpsc::sync_channel::<Pending>(QUEUE_CAPACITY);
        let worker = WriterThread::spawn(dir, starting_seq, segment_bytes, queue_rx)?;

        Ok(Self {
            next_seq: Mutex::new(starting_seq),
            queue_tx: Mutex::new(Some(queue_tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Assigns a sequence number, encodes `op/db/key/timestamp/value` as a
    /// [`Record`], and enqueues it for the writer thread. Returns the
    /// assigned sequence number and a receiver the caller blocks on for
    /// durability confirmation.
    pub fn append(
        &self,
        op: Op,
        db: u32,
        key: Vec<u8>,
        timestamp: i64,
        value: Vec<u8>,
    ) -> Result<(u64, Receiver<Result<(), WalError>>), WalError> {
        let guard = self.queue_tx.lock().unwrap();
        let queue_tx = guard.as_ref().ok_or(WalError::Closed)?;

        let mut next_seq = self.next_seq.lock().unwrap();
        let seq = *next_seq;

        let record = match op {
            Op::Set => Record::new_set(seq, db, key, value, timestamp),
            Op::Del => Record::new_del(seq, db, key, timestamp),
        };
        *next_seq = seq + 1;

        let body = record.encode();
        let (tx, rx) = mpsc::channel();
        if body.len() > MAX_RECORD_BYTES {
            drop(next_seq);
            let _ = tx.send(Err(WalError::RecordTooLarge(MAX_RECORD_BYTES)));
            return Ok((seq, rx));
        }

        let mut frame = Vec::with_capacity(body.len() + 8);
        write_frame(&mut frame, &body)?;
        drop(next_seq);

        queue_tx
            .send(Pending {
                seq,
                frame,
                completion: tx,
            })
            .map_err(|_| WalError::Closed)?;
        Ok((seq, rx))
    }

    /// Signals the writer thread to drain its queue, flush, fsync, and
    /// close the current segment, then joins it.
    pub fn close(&self) -> Result<(), WalError> {
        self.queue_tx.lock().unwrap().take();
        if let Some(handle) = self.worker.lock().unwrap().take() {
            handle.join().map_err(|_| {
                WalError::Io(io::Error::new(io::ErrorKind::Other, "wal writer thread panicked"))
            })?;
        }
        Ok(())
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

struct WriterThread {
    dir: PathBuf,
    segment_bytes: u64,
    current_seq: u64,
    file: BufWriter<File>,
    bytes_in_segment: u64,
}

impl WriterThread {
    fn spawn(
        dir: PathBuf,
        starting_seq: u64,
        segment_bytes: u64,
        queue_rx: Receiver<Pending>,
    ) -> io::Result<JoinHandle<()>> {
        let path = segment_path(&dir, starting_seq);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let mut state = WriterThread {
            dir,
            segment_bytes,
            current_seq: starting_seq,
            file: BufWriter::new(file),
            bytes_in_segment: 0,
        };

        Ok(thread::spawn(move || {
            state.run(queue_rx);
        }))
    }

    fn run(&mut self, queue_rx: Receiver<Pending>) {
        while let Ok(first) = queue_rx.recv() {
            let mut batch = vec![first];
            while let Ok(item) = queue_rx.try_recv() {
                batch.push(item);
            }
            self.process_batch(batch);
        }
        let _ = self.file.flush();
        let _ = self.file.get_ref().sync_all();
    }

    fn process_batch(&mut self, batch: Vec<Pending>) {
        let mut outcome: Result<(), String> = Ok(());

        for item in &batch {
            if outcome.is_err() {
                break;
            }
            if let Err(e) = self.maybe_rollover(item.seq, item.frame.len() as u64) {
                outcome = Err(e.to_string());
                break;
            }
            if let Err(e) = self.file.write_all(&item.frame) {
                outcome = Err(e.to_string());
                break;
            }
            self.bytes_in_segment += item.frame.len() as u64;
        }

        if outcome.is_ok() {
            if let Err(e) = self.file.flush().and_then(|_| self.file.get_ref().sync_all()) {
                outcome = Err(e.to_string());
            }
        }

        for item in batch {
            let result = match &outcome {
                Ok(()) => Ok(()),
                Err(msg) => Err(WalError::Io(io::Error::new(io::ErrorKind::Other, msg.clone()))),
            };
            let _ = item.completion.send(result);
        }
    }

    fn maybe_rollover(&mut self, next_record_seq: u64, incoming_len: u64) -> io::Result<()> {
        if self.bytes_in_segment == 0 {
            return Ok(());
        }
        if self.bytes_in_segment + incoming_len <= self.segment_bytes {
            return Ok(());
        }
        self.file.flush()?;
        self.file.get_ref().sync_all()?;

        let path = segment_path(&self.dir, next_record_seq);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.file = BufWriter::new(file);
        tracing::debug!(from_seq = self.current_seq, to_seq = next_record_seq, "wal segment rollover");
        self.current_seq = next_record_seq;
        self.bytes_in_segment = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
