//! A single registered keyspace: a comparator-ordered set of key/value
//! pairs, maintained as a sorted vector under a read/write lock.
//!
//! A sorted `Vec` rather than a true B-tree or LSM tree keeps the cursor
//! and transaction logic easy to follow while still giving every caller
//! the real contract (ordered, comparator-driven, snapshot-stable
//! cursors) described in §4.2. Recorded as a deliberate simplification in
//! `DESIGN.md` — stream operator state and index caches are small
//! per-operator working sets, not the multi-gigabyte tables a production
//! page-structured tree exists to serve.

use crate::comparator::SharedComparator;
use parking_lot::RwLock;
use std::sync::Arc;

/// Opaque handle returned by `register_keyspace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyspaceId(pub(crate) u32);

/// In-memory contents of one registered keyspace.
pub(crate) struct Keyspace {
    pub(crate) name: String,
    pub(crate) comparator: SharedComparator,
    pub(crate) data: Arc<RwLock<Vec<(Vec<u8>, Vec<u8>)>>>,
}

impl Keyspace {
    pub(crate) fn new(name: String, comparator: SharedComparator) -> Self {
        Self {
            name,
            comparator,
            data: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Binary search for `key`; `Ok(i)` is an exact match at index `i`,
    /// `Err(i)` is the insertion point that keeps the vector sorted.
    pub(crate) fn search(data: &[(Vec<u8>, Vec<u8>)], comparator: &dyn crate::Comparator, key: &[u8]) -> Result<usize, usize> {
        data.binary_search_by(|(k, _)| comparator.compare(k, key))
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let data = self.data.read();
        match Self::search(&data, self.comparator.as_ref(), key) {
            Ok(i) => Some(data[i].1.clone()),
            Err(_) => None,
        }
    }

    pub(crate) fn upsert(&self, key: Vec<u8>, value: Vec<u8>) {
        let mut data = self.data.write();
        match Self::search(&data, self.comparator.as_ref(), &key) {
            Ok(i) => data[i].1 = value,
            Err(i) => data.insert(i, (key, value)),
        }
    }

    pub(crate) fn delete(&self, key: &[u8]) -> bool {
        let mut data = self.data.write();
        match Self::search(&data, self.comparator.as_ref(), key) {
            Ok(i) => {
                data.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// Snapshot the current contents for a cursor to walk independently
    /// of concurrent writers.
    pub(crate) fn snapshot(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data.read().clone()
    }
}
