//! State-function tuple keyspace (§3.1): `funcPut`/`funcGet`/`funcDel`,
//! keyed by an application-defined [`TupleKey`] rather than `(opNum, ts,
//! groupId)`. Not `opNum`-scoped — the tuple's own bytes are expected to
//! carry whatever discriminator the caller needs.

use crate::store::StreamState;
use fluxstore_core::Result;
use fluxstore_keycodec::TupleKey;

impl StreamState {
    /// Write `value` for `tuple` in the state-function keyspace.
    pub fn func_put(&self, tuple: &TupleKey, value: &[u8]) -> Result<()> {
        self.with_txn(|txn| {
            self.backend
                .upsert(self.keyspaces.func, txn, tuple.encode(), value)
        })
    }

    /// Read the value for `tuple` in the state-function keyspace.
    pub fn func_get(&self, tuple: &TupleKey) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        self.backend.get(self.keyspaces.func, tuple.encode())
    }

    /// Delete `tuple` from the state-function keyspace.
    pub fn func_del(&self, tuple: &TupleKey) -> Result<()> {
        self.with_txn(|txn| self.backend.delete(self.keyspaces.func, txn, tuple.encode()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamStateOptions;

    #[test]
    fn func_put_get_del_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StreamState::open(StreamStateOptions::new(dir.path(), "task-1")).unwrap();
        let tuple = TupleKey::new(vec![1, 2, 3]);
        store.func_put(&tuple, b"payload").unwrap();
        assert_eq!(store.func_get(&tuple).unwrap(), Some(b"payload".to_vec()));
        store.func_del(&tuple).unwrap();
        assert_eq!(store.func_get(&tuple).unwrap(), None);
    }
}
