use tempfile::tempdir;

use super::*;
use crate::scanner::scan_all;

#[test]
fn append_assigns_increasing_sequence_numbers() {
    let dir = tempdir().unwrap();
    let w = WalWriter::open(dir.path(), 1, DEFAULT_SEGMENT_BYTES).unwrap();

    let (seq1, rx1) = w.append(Op::Set, 0, b"a".to_vec(), 100, b"1".to_vec()).unwrap();
    let (seq2, rx2) = w.append(Op::Set, 0, b"b".to_vec(), 101, b"2".to_vec()).unwrap();
    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);
    rx1.recv().unwrap().unwrap();
    rx2.recv().unwrap().unwrap();
}

#[test]
fn appended_records_are_durable_after_close() {
    let dir = tempdir().unwrap();
    let w = WalWriter::open(dir.path(), 1, DEFAULT_SEGMENT_BYTES).unwrap();
    for i in 0..50u64 {
        let key = format!("k{i}").into_bytes();
        let (_, rx) = w
            .append(Op::Set, 0, key, i as i64, b"v".to_vec())
            .unwrap();
        rx.recv().unwrap().unwrap();
    }
    w.close().unwrap();

    let records = scan_all(dir.path()).unwrap();
    assert_eq!(records.len(), 50);
    assert_eq!(records[0].seq, 1);
    assert_eq!(records[49].seq, 50);
}

#[test]
fn del_records_carry_an_empty_value() {
    let dir = tempdir().unwrap();
    let w = WalWriter::open(dir.path(), 1, DEFAULT_SEGMENT_BYTES).unwrap();
    let (_, rx) = w.append(Op::Del, 0, b"gone".to_vec(), 5, Vec::new()).unwrap();
    rx.recv().unwrap().unwrap();
    w.close().unwrap();

    let records = scan_all(dir.path()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].op, Op::Del);
    assert!(records[0].value.is_empty());
}

#[test]
fn oversized_record_is_rejected_without_blocking_others() {
    let dir = tempdir().unwrap();
    let w = WalWriter::open(dir.path(), 1, DEFAULT_SEGMENT_BYTES).unwrap();

    let huge = vec![0u8; MAX_RECORD_BYTES + 1];
    let (seq1, rx1) = w.append(Op::Set, 0, b"huge".to_vec(), 1, huge).unwrap();
    assert!(matches!(
        rx1.recv().unwrap(),
        Err(WalError::RecordTooLarge(_))
    ));

    let (seq2, rx2) = w.append(Op::Set, 0, b"ok".to_vec(), 2, b"v".to_vec()).unwrap();
    rx2.recv().unwrap().unwrap();
    assert!(seq2 > seq1);
}

#[test]
fn rolls_over_to_a_new_segment_past_the_size_threshold() {
    let dir = tempdir().unwrap();
    let small_segment = 256u64;
    let w = WalWriter::open(dir.path(), 1, small_segment).unwrap();

    for i in 0..40u64 {
        let value = vec![b'x'; 32];
        let (_, rx) = w
            .append(Op::Set, 0, format!("k{i}").into_bytes(), i as i64, value)
            .unwrap();
        rx.recv().unwrap().unwrap();
    }
    w.close().unwrap();

    let segments = crate::segment::list_segments(dir.path()).unwrap();
    assert!(segments.len() > 1, "expected rollover to produce multiple segments");

    let records = scan_all(dir.path()).unwrap();
    assert_eq!(records.len(), 40);
}

#[test]
fn append_after_close_fails() {
    let dir = tempdir().unwrap();
    let w = WalWriter::open(dir.path(), 1, DEFAULT_SEGMENT_BYTES).unwrap();
    w.close().unwrap();
    let result = w.append(Op::Set, 0, b"a".to_vec(), 1, b"1".to_vec());
    assert!(matches!(result, Err(WalError::Closed)));
}
