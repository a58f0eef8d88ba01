use std::thread;
use std::time::Duration;

use tempfile::tempdir;

use crate::{Engine, EngineOptions};

fn opts() -> EngineOptions {
    EngineOptions {
        flush_threshold_bytes: 1024 * 1024,
        ..EngineOptions::default()
    }
}

#[test]
fn recovery_from_wal() {
    let dir = tempdir().unwrap();

    {
        let engine = Engine::open(dir.path(), opts()).unwrap();
        engine.set(0, b"a", b"1".to_vec()).unwrap();
        engine.set(0, b"b", b"2".to_vec()).unwrap();
        engine.del(0, b"a").unwrap();
        // Engine drops here, forcing a final flush -- recovery below must
        // work whether or not that flush actually ran before the process
        // "crashed", so this also exercises the WAL-replay path.
    }

    let engine = Engine::open(dir.path(), opts()).unwrap();
    assert!(engine.get(0, b"a").unwrap().is_none());
    assert_eq!(engine.get(0, b"b").unwrap().unwrap(), b"2");
}

#[test]
fn recovery_from_sstables() {
    let dir = tempdir().unwrap();

    {
        let engine = Engine::open(dir.path(), opts()).unwrap();
        engine.set(0, b"k", b"v".to_vec()).unwrap();
        engine.force_flush().unwrap();
    }

    let engine = Engine::open(dir.path(), opts()).unwrap();
    assert_eq!(engine.get(0, b"k").unwrap().unwrap(), b"v");
    assert_eq!(engine.sstable_count(), 1);
}

#[test]
fn recovery_combines_wal_and_sstables() {
    let dir = tempdir().unwrap();

    {
        let engine = Engine::open(dir.path(), opts()).unwrap();
        engine.set(0, b"flushed", b"in_sst".to_vec()).unwrap();
        engine.force_flush().unwrap();
        engine.set(0, b"in_wal", b"pending".to_vec()).unwrap();
        // Dropped without an explicit flush here; Drop still flushes
        // whatever remains, so recovery sees two sstables rather than an
        // sstable plus a WAL tail -- either way both keys must survive.
    }

    let engine = Engine::open(dir.path(), opts()).unwrap();
    assert_eq!(engine.get(0, b"flushed").unwrap().unwrap(), b"in_sst");
    assert_eq!(engine.get(0, b"in_wal").unwrap().unwrap(), b"pending");
}

#[test]
fn manifest_preserves_sstables_across_restart() {
    let dir = tempdir().unwrap();

    {
        let engine = Engine::open(dir.path(), opts()).unwrap();
        for i in 0..20u32 {
            engine.set(0, format!("k{i:04}").as_bytes(), b"val".to_vec()).unwrap();
        }
        engine.force_flush().unwrap();
        assert_eq!(engine.sstable_count(), 1);

        for i in 20..25u32 {
            engine.set(0, format!("k{i:04}").as_bytes(), b"val2".to_vec()).unwrap();
        }
        engine.force_flush().unwrap();
        assert_eq!(engine.sstable_count(), 2);
    }

    let engine = Engine::open(dir.path(), opts()).unwrap();
    assert_eq!(engine.sstable_count(), 2, "manifest should preserve both sstables");

    for i in 0..25u32 {
        assert!(
            engine.get(0, format!("k{i:04}").as_bytes()).unwrap().is_some(),
            "k{i:04} should survive restart"
        );
    }
}

#[test]
fn sst_overwrite_across_flushes_returns_newest() {
    let dir = tempdir().unwrap();

    {
        let engine = Engine::open(dir.path(), opts()).unwrap();
        for i in 0..12u32 {
            engine.set(0, b"shared", format!("v{i}").into_bytes()).unwrap();
            engine.force_flush().unwrap();
            thread::sleep(Duration::from_millis(2));
        }
    }

    let engine = Engine::open(dir.path(), opts()).unwrap();
    assert_eq!(
        engine.get(0, b"shared").unwrap().unwrap(),
        b"v11",
        "should read the newest value after recovery"
    );
}

#[test]
fn seq_recovered_from_sstables_continues_strictly_increasing() {
    let dir = tempdir().unwrap();

    {
        let engine = Engine::open(dir.path(), opts()).unwrap();
        engine.set(0, b"a", b"1".to_vec()).unwrap();
        engine.set(0, b"b", b"2".to_vec()).unwrap();
        engine.set(0, b"c", b"3".to_vec()).unwrap();
        engine.force_flush().unwrap();
    }

    let engine = Engine::open(dir.path(), opts()).unwrap();
    // A write after recovery must still resolve as newer than anything
    // already on disk -- if sequence recovery under-counted, this overwrite
    // could be silently dropped by the memtable's stale-write guard.
    engine.set(0, b"a", b"overwritten".to_vec()).unwrap();
    assert_eq!(engine.get(0, b"a").unwrap().unwrap(), b"overwritten");
}

#[test]
fn recovery_from_empty_directory_starts_clean() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), opts()).unwrap();
    assert_eq!(engine.sstable_count(), 0);
    assert!(engine.get(0, b"anything").unwrap().is_none());
}
