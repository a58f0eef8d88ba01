use std::fs;

use tempfile::tempdir;

use crate::{Engine, EngineOptions};

fn opts() -> EngineOptions {
    EngineOptions {
        flush_threshold_bytes: 1024 * 1024,
        ..EngineOptions::default()
    }
}

fn sst_file_count(dir: &std::path::Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|x| x == "sst").unwrap_or(false))
        .count()
}

#[test]
fn flush_creates_live_sstables() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), opts()).unwrap();

    for i in 0..5u32 {
        engine.set(0, format!("k{i:04}").as_bytes(), b"val".to_vec()).unwrap();
        engine.force_flush().unwrap();
    }

    assert_eq!(engine.sstable_count(), 5);
}

#[test]
fn compact_merges_all_live_sstables_into_one() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), opts()).unwrap();

    for i in 0..50u32 {
        engine.set(0, format!("k{i:04}").as_bytes(), b"val".to_vec()).unwrap();
        if i % 5 == 0 {
            engine.force_flush().unwrap();
        }
    }
    engine.force_flush().unwrap();
    assert!(engine.sstable_count() > 1, "should have multiple live sstables");

    engine.force_compact().unwrap();
    assert_eq!(engine.sstable_count(), 1, "compaction should leave exactly one sstable");

    for i in 0..50u32 {
        let key = format!("k{i:04}").into_bytes();
        assert_eq!(engine.get(0, &key).unwrap().unwrap(), b"val");
    }
}

#[test]
fn compact_preserves_newest_value() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), opts()).unwrap();

    engine.set(0, b"key", b"v1".to_vec()).unwrap();
    engine.force_flush().unwrap();
    engine.set(0, b"key", b"v2".to_vec()).unwrap();
    engine.force_flush().unwrap();
    engine.set(0, b"key", b"v3".to_vec()).unwrap();
    engine.force_flush().unwrap();

    engine.force_compact().unwrap();

    assert_eq!(
        engine.get(0, b"key").unwrap().unwrap(),
        b"v3",
        "newest value should survive compaction"
    );
}

#[test]
fn many_keys_with_flushes_and_deletes() {
    let dir = tempdir().unwrap();
    let small_opts = EngineOptions {
        flush_threshold_bytes: 4096,
        ..EngineOptions::default()
    };
    let engine = Engine::open(dir.path(), small_opts).unwrap();

    for i in 0..500u32 {
        let key = format!("key{i:04}").into_bytes();
        engine.set(0, &key, vec![b'v'; 64]).unwrap();
    }
    engine.force_flush().unwrap();

    for i in 0..500u32 {
        let key = format!("key{i:04}").into_bytes();
        assert!(engine.get(0, &key).unwrap().is_some(), "key{i:04} should be readable");
    }

    for i in (0..500u32).step_by(2) {
        let key = format!("key{i:04}").into_bytes();
        engine.del(0, &key).unwrap();
    }
    engine.force_flush().unwrap();

    for i in 0..500u32 {
        let key = format!("key{i:04}").into_bytes();
        if i % 2 == 0 {
            assert!(engine.get(0, &key).unwrap().is_none(), "key{i:04} should be deleted");
        } else {
            assert!(engine.get(0, &key).unwrap().is_some(), "key{i:04} should still exist");
        }
    }
}

#[test]
fn tombstone_gc_removes_dead_keys_during_compaction() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), opts()).unwrap();

    engine.set(0, b"alive", b"yes".to_vec()).unwrap();
    engine.set(0, b"dead", b"soon".to_vec()).unwrap();
    engine.del(0, b"dead").unwrap();
    engine.force_flush().unwrap();

    assert!(engine.get(0, b"dead").unwrap().is_none());

    engine.force_compact().unwrap();

    assert!(engine.get(0, b"dead").unwrap().is_none());
    assert!(engine.get(0, b"alive").unwrap().is_some());
}

#[test]
fn compact_reduces_sst_file_count_on_disk() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), opts()).unwrap();

    for i in 0..50u32 {
        engine.set(0, format!("k{i:04}").as_bytes(), b"val".to_vec()).unwrap();
        if i % 5 == 0 {
            engine.force_flush().unwrap();
        }
    }
    engine.force_flush().unwrap();

    let sst_dir = dir.path().join("sst");
    assert!(sst_file_count(&sst_dir) > 1, "should have multiple .sst files");

    engine.force_compact().unwrap();

    assert_eq!(sst_file_count(&sst_dir), 1, "should have exactly 1 .sst file after compact");
}

#[test]
fn flush_then_compact_then_more_flushes() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), opts()).unwrap();

    for i in 0..20u32 {
        engine.set(0, format!("k{i:04}").as_bytes(), b"v1".to_vec()).unwrap();
    }
    engine.force_flush().unwrap();
    assert!(engine.sstable_count() >= 1);

    engine.force_compact().unwrap();
    assert_eq!(engine.sstable_count(), 1);

    for i in 20..40u32 {
        engine.set(0, format!("k{i:04}").as_bytes(), b"v2".to_vec()).unwrap();
    }
    engine.force_flush().unwrap();
    assert!(engine.sstable_count() > 1, "new flushes should add more sstables");

    for i in 0..40u32 {
        let key = format!("k{i:04}").into_bytes();
        assert!(engine.get(0, &key).unwrap().is_some(), "key {i} should exist");
    }

    engine.force_compact().unwrap();
    assert_eq!(engine.sstable_count(), 1);

    for i in 0..40u32 {
        let key = format!("k{i:04}").into_bytes();
        assert!(
            engine.get(0, &key).unwrap().is_some(),
            "key {i} should exist after second compact"
        );
    }
}

#[test]
fn compact_preserves_tombstones_when_no_sstables_yet() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), opts()).unwrap();

    engine.set(0, b"alive", b"yes".to_vec()).unwrap();
    engine.set(0, b"dead", b"soon".to_vec()).unwrap();
    engine.del(0, b"dead").unwrap();

    // Nothing flushed yet, so compaction has nothing to do.
    engine.force_compact().unwrap();

    assert!(engine.get(0, b"alive").unwrap().is_some(), "alive key should survive");
    assert!(engine.get(0, b"dead").unwrap().is_none(), "deleted key should stay deleted");
}

#[test]
fn compact_with_no_sstables_is_noop() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), opts()).unwrap();

    let before = engine.sstable_count();
    engine.force_compact().unwrap();
    assert_eq!(engine.sstable_count(), before);
}

#[test]
fn compact_then_recovery_works() {
    let dir = tempdir().unwrap();

    {
        let engine = Engine::open(dir.path(), opts()).unwrap();
        for i in 0..30u32 {
            engine.set(0, format!("k{i:04}").as_bytes(), b"val".to_vec()).unwrap();
            if i % 5 == 0 {
                engine.force_flush().unwrap();
            }
        }
        engine.force_flush().unwrap();
        assert!(engine.sstable_count() > 1);
        engine.force_compact().unwrap();
        assert_eq!(engine.sstable_count(), 1);
    }

    let engine = Engine::open(dir.path(), opts()).unwrap();
    assert_eq!(engine.sstable_count(), 1);

    for i in 0..30u32 {
        let key = format!("k{i:04}").into_bytes();
        assert_eq!(
            engine.get(0, &key).unwrap().unwrap(),
            b"val",
            "key should survive recovery after compact"
        );
    }
}
