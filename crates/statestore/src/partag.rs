//! Par-name and par-tag side tables (§3.1): small keyed-by-`groupId` tables
//! an operator uses to remember a group's partition name or partition tag
//! bytes across restarts.

use crate::store::StreamState;
use fluxstore_core::Result;
use fluxstore_keycodec::ParKey;

impl StreamState {
    /// Write `name` for `group_id` in the par-name table.
    pub fn par_name_put(&self, group_id: i64, name: &[u8]) -> Result<()> {
        let key = ParKey(group_id);
        self.with_txn(|txn| {
            self.backend
                .upsert(self.keyspaces.parname, txn, &key.encode(), name)
        })
    }

    /// Read the partition name for `group_id`, if one was ever recorded.
    pub fn par_name_get(&self, group_id: i64) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let key = ParKey(group_id);
        self.backend.get(self.keyspaces.parname, &key.encode())
    }

    /// Remove the partition name recorded for `group_id`.
    pub fn par_name_del(&self, group_id: i64) -> Result<()> {
        let key = ParKey(group_id);
        self.with_txn(|txn| {
            self.backend
                .delete(self.keyspaces.parname, txn, &key.encode())
        })
    }

    /// Write `tag` for `group_id` in the par-tag table.
    pub fn par_tag_put(&self, group_id: i64, tag: &[u8]) -> Result<()> {
        let key = ParKey(group_id);
        self.with_txn(|txn| {
            self.backend
                .upsert(self.keyspaces.partag, txn, &key.encode(), tag)
        })
    }

    /// Read the partition tag bytes for `group_id`, if one was ever
    /// recorded.
    pub fn par_tag_get(&self, group_id: i64) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let key = ParKey(group_id);
        self.backend.get(self.keyspaces.partag, &key.encode())
    }

    /// Remove the partition tag recorded for `group_id`.
    pub fn par_tag_del(&self, group_id: i64) -> Result<()> {
        let key = ParKey(group_id);
        self.with_txn(|txn| {
            self.backend
                .delete(self.keyspaces.partag, txn, &key.encode())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamStateOptions;

    #[test]
    fn par_name_and_par_tag_are_independent_tables() {
        let dir = tempfile::tempdir().unwrap();
        let store = StreamState::open(StreamStateOptions::new(dir.path(), "task-1")).unwrap();
        store.par_name_put(7, b"group-a").unwrap();
        store.par_tag_put(7, b"tag-bytes").unwrap();
        assert_eq!(store.par_name_get(7).unwrap(), Some(b"group-a".to_vec()));
        assert_eq!(store.par_tag_get(7).unwrap(), Some(b"tag-bytes".to_vec()));
        store.par_name_del(7).unwrap();
        assert_eq!(store.par_name_get(7).unwrap(), None);
        assert_eq!(store.par_tag_get(7).unwrap(), Some(b"tag-bytes".to_vec()));
    }
}
