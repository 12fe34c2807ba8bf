//! End-to-end scenarios for the inverted-index engine: put/search, delete,
//! a flush-then-reopen round trip, and multi-column boolean combination.
//!
//! Each test below walks one full scenario rather than a single isolated
//! call, the way the unit tests inside `facade.rs` exercise individual
//! pieces of the same machinery.

use std::time::Duration;

use fluxstore_core::{BoolOp, ColType, OperType, Query, Term};
use fluxstore_indexengine::{IndexEngineOptions, IndexFacade};

fn term(col_name: &str, val: &[u8], uid: u64, op: OperType) -> Term {
    Term {
        col_name: col_name.to_string(),
        col_type: ColType::Binary,
        col_val: val.to_vec(),
        op_type: op,
        suid: 1,
        uid,
    }
}

#[test]
fn put_delete_flush_and_reopen_still_answers_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = IndexEngineOptions::default();
    opts.flush_threshold_bytes = 1;
    let idx = IndexFacade::open(dir.path(), 1, opts).unwrap();

    // Scenario 1: two adds to the same column/value are both visible.
    idx.put(&term("k", b"a", 1, OperType::Add)).unwrap();
    std::thread::sleep(Duration::from_millis(150));
    idx.put(&term("k", b"a", 2, OperType::Add)).unwrap();
    std::thread::sleep(Duration::from_millis(150));
    let hits = idx
        .search(&[("k".to_string(), Query::Eq(b"a".to_vec()))], BoolOp::Must)
        .unwrap();
    assert_eq!(hits, vec![1, 2]);

    // Scenario 2: deleting one uid removes it from the result.
    idx.delete("k", b"a".to_vec(), ColType::Binary, 1).unwrap();
    std::thread::sleep(Duration::from_millis(150));
    let hits = idx
        .search(&[("k".to_string(), Query::Eq(b"a".to_vec()))], BoolOp::Must)
        .unwrap();
    assert_eq!(hits, vec![2]);

    idx.close().unwrap();
    drop(idx);

    // Scenario 3: a brand new facade over the same directory, with no
    // warm in-memory cache, must answer the query purely from the TFile
    // segment(s) the threshold-triggered flushes above wrote to disk.
    let reopened = IndexFacade::open(dir.path(), 1, IndexEngineOptions::default()).unwrap();
    let hits = reopened
        .search(&[("k".to_string(), Query::Eq(b"a".to_vec()))], BoolOp::Must)
        .unwrap();
    assert_eq!(hits, vec![2]);
}

#[test]
fn two_columns_must_and_should_combine_across_postings() {
    let dir = tempfile::tempdir().unwrap();
    let idx = IndexFacade::open(dir.path(), 1, IndexEngineOptions::default()).unwrap();

    // Scenario 4: k1 -> {1,2}, k2 -> {2,3}.
    idx.put(&term("k1", b"x", 1, OperType::Add)).unwrap();
    idx.put(&term("k1", b"x", 2, OperType::Add)).unwrap();
    idx.put(&term("k2", b"y", 2, OperType::Add)).unwrap();
    idx.put(&term("k2", b"y", 3, OperType::Add)).unwrap();

    let must = idx
        .search(
            &[
                ("k1".to_string(), Query::Eq(b"x".to_vec())),
                ("k2".to_string(), Query::Eq(b"y".to_vec())),
            ],
            BoolOp::Must,
        )
        .unwrap();
    assert_eq!(must, vec![2]);

    let should = idx
        .search(
            &[
                ("k1".to_string(), Query::Eq(b"x".to_vec())),
                ("k2".to_string(), Query::Eq(b"y".to_vec())),
            ],
            BoolOp::Should,
        )
        .unwrap();
    assert_eq!(should, vec![1, 2, 3]);
}
