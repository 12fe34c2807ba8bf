//! Process-wide cache of the latest `TFileReader` per `(suid, colName)`
//! (§4.5, §4.6). The facade installs a new reader here the instant a flush
//! finishes writing its segment; the previous reader is simply dropped —
//! any in-flight searches still holding an `Arc` clone from before the
//! swap keep it alive until they finish, which is the ref/unref semantics
//! the spec describes, expressed the idiomatic-Rust way.

use crate::reader::TFileReader;
use fluxstore_core::ColType;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    suid: i64,
    col_name: String,
    col_type: ColType,
}

/// Maps `(suid, colName, colType)` to the newest sealed segment reader for
/// that column.
#[derive(Default)]
pub struct ReaderCache {
    readers: RwLock<HashMap<CacheKey, Arc<TFileReader>>>,
}

impl ReaderCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the current reader for a column, if a segment has been
    /// installed yet.
    pub fn get(&self, suid: i64, col_name: &str, col_type: ColType) -> Option<Arc<TFileReader>> {
        let key = CacheKey {
            suid,
            col_name: col_name.to_string(),
            col_type,
        };
        self.readers.read().get(&key).cloned()
    }

    /// Atomically replace the reader installed for a column. Called once a
    /// flush or rebuild has finished writing its segment and wants it to
    /// become the one future searches observe.
    pub fn install(&self, reader: Arc<TFileReader>) {
        let key = CacheKey {
            suid: reader.suid(),
            col_name: reader.col_name().to_string(),
            col_type: reader.col_type(),
        };
        self.readers.write().insert(key, reader);
    }

    /// Drop the reader for a column, if any (used when a column's segment
    /// is deleted outright rather than replaced).
    pub fn remove(&self, suid: i64, col_name: &str, col_type: ColType) {
        let key = CacheKey {
            suid,
            col_name: col_name.to_string(),
            col_type,
        };
        self.readers.write().remove(&key);
    }
}
