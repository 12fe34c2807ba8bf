//! Operator-scoped cursor walk over the interval-window keyspace (§4.3):
//! `seekKeyNext`/`seekKeyPrev`/`curNext`/`curPrev`/`getKVByCur`.
//!
//! A [`StateCursor`] is scoped to the `opNum` it was opened under. Walking
//! past the edge of that operator's own keys is not an error — `current`
//! simply returns `None`, per the cursor contract in §4.2 — but reading a
//! key that belongs to a *different* operator (which can only happen if a
//! caller seeks with the wrong `opNum` in the first place) is rejected with
//! [`Error::OperatorMismatch`], since that would leak one operator's state
//! into another's view.

use fluxstore_core::{Error, Result};
use fluxstore_keycodec::{StateKey, WinKey};
use fluxstore_kvstore::{Cursor, SeekResult};

use crate::store::StreamState;

/// A cursor over the interval-window keyspace, scoped to one `opNum`.
pub struct StateCursor {
    cursor: Cursor,
    op_num: i32,
}

impl StateCursor {
    /// Position at the smallest window `>= win` for this cursor's `opNum`.
    pub fn seek_key_next(&mut self, win: WinKey) -> Result<Option<(WinKey, Vec<u8>)>> {
        let key = StateKey::new(self.op_num, win.ts, win.group_id);
        self.cursor.seek(&key.encode());
        self.get_kv_by_cur()
    }

    /// Position at the largest window `<= win` for this cursor's `opNum`.
    pub fn seek_key_prev(&mut self, win: WinKey) -> Result<Option<(WinKey, Vec<u8>)>> {
        let key = StateKey::new(self.op_num, win.ts, win.group_id);
        match self.cursor.seek(&key.encode()) {
            SeekResult::Positioned(std::cmp::Ordering::Equal) => {}
            SeekResult::Positioned(_) => {
                // `seek` lands on the first key >= win; back up one step
                // unless that landed past this operator's own range.
                if !self.cursor.move_prev() {
                    return Ok(None);
                }
            }
            SeekResult::Empty => {
                self.cursor.move_last();
            }
        }
        self.get_kv_by_cur()
    }

    /// Step forward one window.
    pub fn cur_next(&mut self) -> Result<Option<(WinKey, Vec<u8>)>> {
        if !self.cursor.move_next() {
            return Ok(None);
        }
        self.get_kv_by_cur()
    }

    /// Step backward one window.
    pub fn cur_prev(&mut self) -> Result<Option<(WinKey, Vec<u8>)>> {
        if !self.cursor.move_prev() {
            return Ok(None);
        }
        self.get_kv_by_cur()
    }

    /// Read the window/value pair at the current position. `None` if the
    /// cursor is off the end; [`Error::OperatorMismatch`] if the current
    /// key belongs to a different `opNum`.
    pub fn get_kv_by_cur(&self) -> Result<Option<(WinKey, Vec<u8>)>> {
        let Some((key, value)) = self.cursor.current() else {
            return Ok(None);
        };
        let decoded = StateKey::decode(key)
            .ok_or_else(|| Error::Corruption("malformed StateKey in state keyspace".into()))?;
        if decoded.op_num != self.op_num {
            return Err(Error::OperatorMismatch {
                expected: self.op_num,
                actual: decoded.op_num,
            });
        }
        Ok(Some((decoded.win, value.to_vec())))
    }
}

impl StreamState {
    /// Open a [`StateCursor`] scoped to the store's current `opNum`.
    pub fn state_cursor(&self) -> Result<StateCursor> {
        self.check_open()?;
        let cursor = self.backend.open_cursor(self.keyspaces.state, None)?;
        Ok(StateCursor {
            cursor,
            op_num: self.op_num(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamStateOptions;

    fn open_store(dir: &std::path::Path) -> StreamState {
        StreamState::open(StreamStateOptions::new(dir, "task-1")).unwrap()
    }

    #[test]
    fn seek_next_then_cur_next_walks_forward() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store.set_number(1);
        store.put(WinKey::new(10, 1), b"a").unwrap();
        store.put(WinKey::new(20, 1), b"b").unwrap();
        store.put(WinKey::new(30, 1), b"c").unwrap();

        let mut cur = store.state_cursor().unwrap();
        let (win, val) = cur.seek_key_next(WinKey::new(15, 1)).unwrap().unwrap();
        assert_eq!(win, WinKey::new(20, 1));
        assert_eq!(val, b"b");

        let (win, val) = cur.cur_next().unwrap().unwrap();
        assert_eq!(win, WinKey::new(30, 1));
        assert_eq!(val, b"c");

        assert!(cur.cur_next().unwrap().is_none());
    }

    #[test]
    fn seek_prev_lands_on_largest_key_at_or_before() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store.set_number(1);
        store.put(WinKey::new(10, 1), b"a").unwrap();
        store.put(WinKey::new(30, 1), b"c").unwrap();

        let mut cur = store.state_cursor().unwrap();
        let (win, _) = cur.seek_key_prev(WinKey::new(20, 1)).unwrap().unwrap();
        assert_eq!(win, WinKey::new(10, 1));
    }

    #[test]
    fn cursor_never_crosses_into_another_operator() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store.set_number(1);
        store.put(WinKey::new(10, 1), b"a").unwrap();
        store.set_number(2);
        store.put(WinKey::new(20, 1), b"b").unwrap();

        store.set_number(1);
        let mut cur = store.state_cursor().unwrap();
        cur.seek_key_next(WinKey::new(0, 1)).unwrap();
        assert!(
            matches!(cur.cur_next(), Err(Error::OperatorMismatch { expected: 1, actual: 2 })),
            "stepping into opNum 2's rows must surface as a mismatch, not leak the data"
        );
    }

    #[test]
    fn moving_past_the_end_is_none_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store.set_number(1);
        store.put(WinKey::new(10, 1), b"a").unwrap();
        let mut cur = store.state_cursor().unwrap();
        cur.seek_key_next(WinKey::new(10, 1)).unwrap();
        assert!(cur.cur_next().unwrap().is_none());
        assert!(cur.cur_next().unwrap().is_none());
    }
}
