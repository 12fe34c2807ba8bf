//! Interval-window (`StateKey`) and fill-window (`WinKey`) operations,
//! scoped to the store's current `opNum` for the interval-window keyspace
//! and unscoped for fill (§3.1, §4.3).

use crate::store::StreamState;
use fluxstore_core::Result;
use fluxstore_keycodec::{StateKey, WinKey};

impl StreamState {
    /// Write `value` for `(opNum, win)` in the interval-window keyspace.
    pub fn put(&self, win: WinKey, value: &[u8]) -> Result<()> {
        let key = StateKey::new(self.op_num(), win.ts, win.group_id);
        self.with_txn(|txn| {
            self.backend
                .upsert(self.keyspaces.state, txn, &key.encode(), value)
        })
    }

    /// Read the value for `(opNum, win)` in the interval-window keyspace.
    pub fn get(&self, win: WinKey) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let key = StateKey::new(self.op_num(), win.ts, win.group_id);
        self.backend.get(self.keyspaces.state, &key.encode())
    }

    /// Delete `(opNum, win)` from the interval-window keyspace.
    pub fn del(&self, win: WinKey) -> Result<()> {
        let key = StateKey::new(self.op_num(), win.ts, win.group_id);
        self.with_txn(|txn| {
            self.backend
                .delete(self.keyspaces.state, txn, &key.encode())
        })
    }

    /// Write `value` for `win` in the fill keyspace (not opNum-scoped).
    pub fn fill_put(&self, win: WinKey, value: &[u8]) -> Result<()> {
        self.with_txn(|txn| {
            self.backend
                .upsert(self.keyspaces.fill, txn, &win.encode(), value)
        })
    }

    /// Read the value for `win` in the fill keyspace.
    pub fn fill_get(&self, win: WinKey) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        self.backend.get(self.keyspaces.fill, &win.encode())
    }

    /// Delete `win` from the fill keyspace.
    pub fn fill_del(&self, win: WinKey) -> Result<()> {
        self.with_txn(|txn| self.backend.delete(self.keyspaces.fill, txn, &win.encode()))
    }

    /// Delete every `StateKey` row belonging to `op_num`. Used by
    /// [`StreamState::clear`].
    pub(crate) fn clear_state_keyspace(&self, op_num: i32) -> Result<()> {
        let matches = self.keys_for_op_num(self.keyspaces.state, op_num, |buf| {
            StateKey::decode(buf).map(|k| k.op_num)
        })?;
        self.with_txn(|txn| {
            for key in &matches {
                self.backend.delete(self.keyspaces.state, txn, key)?;
            }
            Ok(())
        })
    }

    /// Collect every encoded key in `ks` whose decoded `opNum` (via
    /// `op_num_of`) equals `op_num`. Used to scope bulk deletes, since the
    /// underlying keyspace is ordered by `(opNum, ...)` but has no
    /// dedicated range-delete primitive.
    pub(crate) fn keys_for_op_num(
        &self,
        ks: fluxstore_kvstore::KeyspaceId,
        op_num: i32,
        op_num_of: impl Fn(&[u8]) -> Option<i32>,
    ) -> Result<Vec<Vec<u8>>> {
        let mut cursor = self.backend.open_cursor(ks, None)?;
        cursor.move_first();
        let mut out = Vec::new();
        while let Some((key, _)) = cursor.current() {
            if op_num_of(key) == Some(op_num) {
                out.push(key.to_vec());
            }
            if !cursor.move_next() {
                break;
            }
        }
        Ok(out)
    }
}
