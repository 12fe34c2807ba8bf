//! Session-window operations (§3.1, §4.3): `sessionPut`/`sessionGet`/
//! `sessionDel`, the range probe `sessionGetKeyByRange`, and the
//! merge-or-create probe `sessionAddIfNotExist`.
//!
//! Storage order for the session keyspace is the *total* order
//! (`state_session_key_cmp`, i.e. `(opNum, groupId, skey, ekey)`) so that
//! keys sort consistently and cursors walk them deterministically. The
//! *range* comparator (`session_key_range_cmp`) is never used to order the
//! keyspace — only to decide, after a total-order seek, whether a
//! neighboring entry overlaps the caller's probe key.

use crate::store::StreamState;
use fluxstore_core::Result;
use fluxstore_keycodec::{
    session_key_range_cmp, SessionKey, SessionRange, StateSessionKey,
};
use std::cmp::Ordering;

impl StreamState {
    /// Write `value` for `(opNum, session)` in the session keyspace.
    pub fn session_put(&self, session: SessionKey, value: &[u8]) -> Result<()> {
        let key = StateSessionKey::new(self.op_num(), session);
        self.with_txn(|txn| {
            self.backend
                .upsert(self.keyspaces.session, txn, &key.encode(), value)
        })
    }

    /// Read the value for `(opNum, session)` in the session keyspace.
    pub fn session_get(&self, session: SessionKey) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let key = StateSessionKey::new(self.op_num(), session);
        self.backend.get(self.keyspaces.session, &key.encode())
    }

    /// Delete `(opNum, session)` from the session keyspace.
    pub fn session_del(&self, session: SessionKey) -> Result<()> {
        let key = StateSessionKey::new(self.op_num(), session);
        self.with_txn(|txn| {
            self.backend
                .delete(self.keyspaces.session, txn, &key.encode())
        })
    }

    /// Find the session (scoped to the current `opNum`) whose interval
    /// overlaps `probe`'s, if any.
    ///
    /// Positions a cursor at the first stored session `>= probe` in total
    /// order, then checks that entry and its immediate neighbors for range
    /// overlap: the seek position itself (it may already overlap), the
    /// previous entry (smaller `skey` but possibly an `ekey` that still
    /// reaches into `probe`), and the next entry (covers an exact-`skey`
    /// tie where a second session with the same `skey` follows). The first
    /// overlap found, preferring the seek position, is returned.
    pub fn session_get_key_by_range(&self, probe: SessionKey) -> Result<Option<SessionKey>> {
        self.check_open()?;
        let op_num = self.op_num();
        let seek_key = StateSessionKey::new(op_num, probe);

        let mut at = self.backend.open_cursor(self.keyspaces.session, None)?;
        let seek_result = at.seek(&seek_key.encode());
        if !matches!(seek_result, fluxstore_kvstore::SeekResult::Empty) {
            if let Some(found) = self.overlap_at_cursor(&at, op_num, &probe) {
                return Ok(Some(found));
            }
        }

        let mut prev = self.backend.open_cursor(self.keyspaces.session, None)?;
        let positioned = match seek_result {
            // `seek` never found a position to fall back from; the largest
            // stored key (if any) is the only candidate "previous" entry.
            fluxstore_kvstore::SeekResult::Empty => {
                prev.move_last();
                prev.is_valid()
            }
            _ => {
                prev.seek(&seek_key.encode());
                prev.move_prev()
            }
        };
        if positioned {
            if let Some(found) = self.overlap_at_cursor(&prev, op_num, &probe) {
                return Ok(Some(found));
            }
        }

        if at.move_next() {
            if let Some(found) = self.overlap_at_cursor(&at, op_num, &probe) {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    fn overlap_at_cursor(
        &self,
        cursor: &fluxstore_kvstore::Cursor,
        op_num: i32,
        probe: &SessionKey,
    ) -> Option<SessionKey> {
        let (key, _) = cursor.current()?;
        let decoded = StateSessionKey::decode(key)?;
        if decoded.op_num != op_num {
            return None;
        }
        if session_key_range_cmp(&decoded.session, probe) == Ordering::Equal {
            Some(decoded.session)
        } else {
            None
        }
    }

    /// Probe for an existing session that, widened by `gap`, overlaps
    /// `probe`. If found, the two are merged: the old row is deleted, the
    /// merged span `[min(skey), max(ekey)]` is written back with the old
    /// row's value, and `(merged_key, old_value, false)` is returned. If
    /// neither the previous nor the next session (by total order) overlaps,
    /// a fresh row of `probe`'s own span is created with a
    /// `new_value_len`-byte zero-initialized value, and
    /// `(probe, zeros, true)` is returned.
    pub fn session_add_if_not_exist(
        &self,
        probe: SessionKey,
        gap: i64,
        new_value_len: usize,
    ) -> Result<(SessionKey, Vec<u8>, bool)> {
        self.check_open()?;
        let op_num = self.op_num();
        let widened = SessionRange::new(
            probe.win.skey.saturating_sub(gap),
            probe.win.ekey.saturating_add(gap),
        );
        let widened_probe = SessionKey {
            group_id: probe.group_id,
            win: widened,
        };

        if let Some(existing) = self.neighbor_overlap(op_num, &widened_probe)? {
            let old_key = StateSessionKey::new(op_num, existing);
            let old_value = self
                .backend
                .get(self.keyspaces.session, &old_key.encode())?
                .unwrap_or_default();
            let merged = SessionKey {
                group_id: existing.group_id,
                win: existing.win.merge(&probe.win),
            };
            let merged_key = StateSessionKey::new(op_num, merged);
            self.with_txn(|txn| {
                self.backend
                    .delete(self.keyspaces.session, txn, &old_key.encode())?;
                self.backend.upsert(
                    self.keyspaces.session,
                    txn,
                    &merged_key.encode(),
                    &old_value,
                )
            })?;
            return Ok((merged, old_value, false));
        }

        let key = StateSessionKey::new(op_num, probe);
        let zeros = vec![0u8; new_value_len];
        self.with_txn(|txn| {
            self.backend
                .upsert(self.keyspaces.session, txn, &key.encode(), &zeros)
        })?;
        Ok((probe, zeros, true))
    }

    /// Look at the previous and next stored sessions (by total order,
    /// scoped to `op_num`) around `probe` and return the first whose range
    /// overlaps `probe`'s, per `session_key_range_cmp`.
    fn neighbor_overlap(&self, op_num: i32, probe: &SessionKey) -> Result<Option<SessionKey>> {
        let seek_key = StateSessionKey::new(op_num, *probe);

        let mut at = self.backend.open_cursor(self.keyspaces.session, None)?;
        let seek_result = at.seek(&seek_key.encode());
        if at.is_valid() {
            if let Some(found) = self.overlap_at_cursor(&at, op_num, probe) {
                return Ok(Some(found));
            }
        }

        let mut prev = self.backend.open_cursor(self.keyspaces.session, None)?;
        let positioned = match seek_result {
            // Nothing sorted >= probe, so `move_prev` from an unset position
            // has no entry to back up from; the largest stored key is the
            // only candidate previous entry.
            fluxstore_kvstore::SeekResult::Empty => {
                prev.move_last();
                prev.is_valid()
            }
            _ => {
                prev.seek(&seek_key.encode());
                prev.move_prev()
            }
        };
        if positioned {
            if let Some(found) = self.overlap_at_cursor(&prev, op_num, probe) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Delete every `StateSessionKey` row belonging to `op_num`. Used by
    /// [`StreamState::clear`].
    pub(crate) fn clear_session_keyspace(&self, op_num: i32) -> Result<()> {
        let matches = self.keys_for_op_num(self.keyspaces.session, op_num, |buf| {
            StateSessionKey::decode(buf).map(|k| k.op_num)
        })?;
        self.with_txn(|txn| {
            for key in &matches {
                self.backend.delete(self.keyspaces.session, txn, key)?;
            }
            Ok(())
        })
    }
}
