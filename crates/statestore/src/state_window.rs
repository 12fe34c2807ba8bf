//! `stateAddIfNotExist` (§4.3): the state-window merge-or-create probe.
//!
//! State windows are interval-keyed exactly like session windows
//! (`SessionKey`/`StateSessionKey`), so this reuses the session keyspace
//! rather than inventing a seventh on-disk table. The two probes differ
//! only in their merge test: sessions merge on a time gap
//! ([`StreamState::session_add_if_not_exist`]), state windows merge when
//! the candidate interval overlaps *or* its caller-supplied extension
//! bytes compare equal under `eq` (content-defined windows, e.g. "same
//! value as the current window").
//!
//! Row values in this keyspace are `[ext_len: u32 LE][ext bytes][payload]`
//! so the extension bytes used for the equality test travel with the row
//! instead of living in a side table.

use crate::store::StreamState;
use fluxstore_core::{Error, Result};
use fluxstore_keycodec::{SessionKey, StateSessionKey};

fn encode_row(ext: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + ext.len() + payload.len());
    out.extend_from_slice(&(ext.len() as u32).to_le_bytes());
    out.extend_from_slice(ext);
    out.extend_from_slice(payload);
    out
}

fn decode_row(raw: &[u8]) -> Result<(&[u8], &[u8])> {
    if raw.len() < 4 {
        return Err(Error::Corruption("state-window row shorter than its length prefix".into()));
    }
    let ext_len = u32::from_le_bytes(raw[0..4].try_into().unwrap()) as usize;
    if raw.len() < 4 + ext_len {
        return Err(Error::Corruption("state-window row truncated before its extension bytes".into()));
    }
    Ok((&raw[4..4 + ext_len], &raw[4 + ext_len..]))
}

impl StreamState {
    /// Write a state-window row: `probe`'s span, `ext` extension bytes, and
    /// `payload`.
    pub fn state_window_put(&self, probe: SessionKey, ext: &[u8], payload: &[u8]) -> Result<()> {
        let key = StateSessionKey::new(self.op_num(), probe);
        let row = encode_row(ext, payload);
        self.with_txn(|txn| {
            self.backend
                .upsert(self.keyspaces.session, txn, &key.encode(), &row)
        })
    }

    /// Read a state-window row's `(ext, payload)`.
    pub fn state_window_get(&self, probe: SessionKey) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.check_open()?;
        let key = StateSessionKey::new(self.op_num(), probe);
        match self.backend.get(self.keyspaces.session, &key.encode())? {
            Some(raw) => {
                let (ext, payload) = decode_row(&raw)?;
                Ok(Some((ext.to_vec(), payload.to_vec())))
            }
            None => Ok(None),
        }
    }

    /// Probe the previous and next stored state-window rows (scoped to the
    /// current `opNum`) for one that either temporally overlaps `probe` or
    /// carries extension bytes `eq`-equal to `ext_key_bytes`. On a match,
    /// the old row is deleted, a merged row spanning both intervals is
    /// written with the old row's extension and payload, and
    /// `(merged_key, old_payload, false)` is returned. Otherwise a fresh
    /// row is created with `ext_key_bytes` and a `new_payload_len`-byte
    /// zero payload, returning `(probe, zeros, true)`.
    pub fn state_add_if_not_exist(
        &self,
        probe: SessionKey,
        ext_key_bytes: &[u8],
        eq: impl Fn(&[u8], &[u8]) -> bool,
        new_payload_len: usize,
    ) -> Result<(SessionKey, Vec<u8>, bool)> {
        self.check_open()?;
        let op_num = self.op_num();

        if let Some((existing, ext, payload)) =
            self.state_window_neighbor_match(op_num, &probe, ext_key_bytes, &eq)?
        {
            let old_key = StateSessionKey::new(op_num, existing);
            let merged = SessionKey {
                group_id: existing.group_id,
                win: existing.win.merge(&probe.win),
            };
            let merged_key = StateSessionKey::new(op_num, merged);
            let row = encode_row(&ext, &payload);
            self.with_txn(|txn| {
                self.backend
                    .delete(self.keyspaces.session, txn, &old_key.encode())?;
                self.backend
                    .upsert(self.keyspaces.session, txn, &merged_key.encode(), &row)
            })?;
            return Ok((merged, payload, false));
        }

        let key = StateSessionKey::new(op_num, probe);
        let zeros = vec![0u8; new_payload_len];
        let row = encode_row(ext_key_bytes, &zeros);
        self.with_txn(|txn| {
            self.backend
                .upsert(self.keyspaces.session, txn, &key.encode(), &row)
        })?;
        Ok((probe, zeros, true))
    }

    fn state_window_neighbor_match(
        &self,
        op_num: i32,
        probe: &SessionKey,
        ext_key_bytes: &[u8],
        eq: &impl Fn(&[u8], &[u8]) -> bool,
    ) -> Result<Option<(SessionKey, Vec<u8>, Vec<u8>)>> {
        let seek_key = StateSessionKey::new(op_num, *probe);

        let mut at = self.backend.open_cursor(self.keyspaces.session, None)?;
        let seek_result = at.seek(&seek_key.encode());
        if let Some(m) = self.state_window_match_at(&at, op_num, probe, ext_key_bytes, eq)? {
            return Ok(Some(m));
        }

        let mut prev = self.backend.open_cursor(self.keyspaces.session, None)?;
        let positioned = match seek_result {
            // No stored key sorted >= probe, so there is nothing for
            // `move_prev` to back up from; fall back to the largest key.
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
            if let Some(m) = self.state_window_match_at(&prev, op_num, probe, ext_key_bytes, eq)? {
                return Ok(Some(m));
            }
        }
        Ok(None)
    }

    fn state_window_match_at(
        &self,
        cursor: &fluxstore_kvstore::Cursor,
        op_num: i32,
        probe: &SessionKey,
        ext_key_bytes: &[u8],
        eq: &impl Fn(&[u8], &[u8]) -> bool,
    ) -> Result<Option<(SessionKey, Vec<u8>, Vec<u8>)>> {
        let Some((key, raw)) = cursor.current() else {
            return Ok(None);
        };
        let Some(decoded) = StateSessionKey::decode(key) else {
            return Ok(None);
        };
        if decoded.op_num != op_num {
            return Ok(None);
        }
        let (ext, payload) = decode_row(raw)?;
        let matches = decoded.session.win.overlaps(&probe.win) || eq(ext, ext_key_bytes);
        if matches {
            Ok(Some((decoded.session, ext.to_vec(), payload.to_vec())))
        } else {
            Ok(None)
        }
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
    fn creates_when_no_overlap_and_no_equal_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let (key, val, created) = store
            .state_add_if_not_exist(SessionKey::new(1, 0, 10), b"A", |a, b| a == b, 4)
            .unwrap();
        assert!(created);
        assert_eq!(key, SessionKey::new(1, 0, 10));
        assert_eq!(val, vec![0u8; 4]);
    }

    #[test]
    fn merges_on_temporal_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store
            .state_add_if_not_exist(SessionKey::new(1, 0, 10), b"A", |a, b| a == b, 0)
            .unwrap();
        let (key, _, created) = store
            .state_add_if_not_exist(SessionKey::new(1, 5, 20), b"B", |a, b| a == b, 0)
            .unwrap();
        assert!(!created);
        assert_eq!(key, SessionKey::new(1, 0, 20));
    }

    #[test]
    fn merges_on_extension_equality_without_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store
            .state_add_if_not_exist(SessionKey::new(1, 0, 10), b"same-value", |a, b| a == b, 0)
            .unwrap();
        let (key, _, created) = store
            .state_add_if_not_exist(SessionKey::new(1, 1000, 1010), b"same-value", |a, b| a == b, 0)
            .unwrap();
        assert!(!created);
        assert_eq!(key, SessionKey::new(1, 0, 1010));
    }

    #[test]
    fn does_not_merge_distinct_extension_without_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store
            .state_add_if_not_exist(SessionKey::new(1, 0, 10), b"A", |a, b| a == b, 0)
            .unwrap();
        let (_, _, created) = store
            .state_add_if_not_exist(SessionKey::new(1, 1000, 1010), b"B", |a, b| a == b, 0)
            .unwrap();
        assert!(created);
    }
}
