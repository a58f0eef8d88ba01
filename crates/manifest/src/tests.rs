use tempfile::tempdir;

use super::*;

#[test]
fn fresh_directory_yields_empty_descriptor() {
    let dir = tempdir().unwrap();
    let d = Descriptor::load_latest(dir.path()).unwrap();
    assert_eq!(d.version, 0);
    assert!(d.sst_metas.is_empty());
}

#[test]
fn save_then_load_roundtrips() {
    let dir = tempdir().unwrap();
    let mut d = Descriptor {
        sst_metas: vec![
            SstMeta {
                filename: "00000000001.sst".into(),
                applied_until: 10,
            },
            SstMeta {
                filename: "00000000002.sst".into(),
                applied_until: 25,
            },
        ],
        version: 0,
    };
    d.save(dir.path()).unwrap();
    assert_eq!(d.version, 1);

    let loaded = Descriptor::load_latest(dir.path()).unwrap();
    assert_eq!(loaded, d);
    assert_eq!(loaded.max_applied(), 25);
}

#[test]
fn save_rotates_version_and_removes_prior_file() {
    let dir = tempdir().unwrap();
    let mut d = Descriptor {
        sst_metas: vec![],
        version: 0,
    };
    d.save(dir.path()).unwrap();
    assert!(dir.path().join("MANIFEST-1").exists());

    d.sst_metas.push(SstMeta {
        filename: "x.sst".into(),
        applied_until: 5,
    });
    d.save(dir.path()).unwrap();
    assert!(dir.path().join("MANIFEST-2").exists());
    assert!(!dir.path().join("MANIFEST-1").exists());

    let loaded = Descriptor::load_latest(dir.path()).unwrap();
    assert_eq!(loaded.version, 2);
    assert_eq!(loaded.sst_metas.len(), 1);
}

#[test]
fn load_latest_picks_highest_numeric_suffix_not_lexical() {
    let dir = tempdir().unwrap();
    let mut d = Descriptor {
        sst_metas: vec![],
        version: 0,
    };
    for _ in 0..11 {
        d.save(dir.path()).unwrap();
    }
    assert_eq!(d.version, 11);
    let loaded = Descriptor::load_latest(dir.path()).unwrap();
    assert_eq!(loaded.version, 11);
}

#[test]
fn corrupt_manifest_is_rejected() {
    let dir = tempdir().unwrap();
    let mut d = Descriptor {
        sst_metas: vec![SstMeta {
            filename: "a.sst".into(),
            applied_until: 1,
        }],
        version: 0,
    };
    d.save(dir.path()).unwrap();

    let path = dir.path().join("MANIFEST-1");
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&path, bytes).unwrap();

    assert!(Descriptor::load_latest(dir.path()).is_err());
}
