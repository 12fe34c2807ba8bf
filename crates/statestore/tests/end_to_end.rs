//! End-to-end scenarios for the stream state store: the session-window
//! merge-or-create probe, and `opNum`-scoped cursor isolation.

use fluxstore_core::Error;
use fluxstore_keycodec::{SessionKey, WinKey};
use fluxstore_statestore::{StreamState, StreamStateOptions};

fn open_store(dir: &std::path::Path) -> StreamState {
    StreamState::open(StreamStateOptions::new(dir, "task-1")).unwrap()
}

#[test]
fn session_add_if_not_exist_creates_then_merges_then_ranges_find_the_merged_span() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    store.set_number(1);

    // Scenario 5: first probe creates a fresh row.
    let (key1, _, created1) = store
        .session_add_if_not_exist(SessionKey::new(1, 100, 200), 10, 0)
        .unwrap();
    assert!(created1);
    assert_eq!(key1, SessionKey::new(1, 100, 200));

    // A second probe 5 past the first's end, widened by the gap, overlaps
    // and merges rather than creating a second row.
    let (key2, _, created2) = store
        .session_add_if_not_exist(SessionKey::new(1, 205, 210), 10, 0)
        .unwrap();
    assert!(!created2);
    assert_eq!(key2, SessionKey::new(1, 100, 210));

    // A range probe landing inside the merged span finds it.
    let found = store
        .session_get_key_by_range(SessionKey::new(1, 150, 160))
        .unwrap();
    assert_eq!(found, Some(SessionKey::new(1, 100, 210)));
}

#[test]
fn op_num_scoping_isolates_both_point_lookups_and_cursor_walks() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    // Scenario 6: two operators write to the same window key.
    store.set_number(1);
    store.put(WinKey::new(5, 1), b"A").unwrap();
    store.set_number(2);
    store.put(WinKey::new(5, 1), b"B").unwrap();

    store.set_number(1);
    assert_eq!(store.get(WinKey::new(5, 1)).unwrap(), Some(b"A".to_vec()));

    let mut cur = store.state_cursor().unwrap();
    cur.seek_key_next(WinKey::new(0, 1)).unwrap();
    assert!(
        matches!(
            cur.cur_next(),
            Err(Error::OperatorMismatch { expected: 1, actual: 2 })
        ),
        "a cursor opened under opNum 1 must never surface opNum 2's row"
    );
}
