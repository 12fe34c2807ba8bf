//! `IndexCache` (§4.4): one column's in-memory write buffer. Entries are
//! kept in a `BTreeMap` so `colVal` order falls out of the map itself
//! (matching TFile's on-disk term order, which the flush merge relies
//! on), each entry holding every `(uid, operType)` record written for
//! that `colVal` since the cache was created.

use crate::config::{CacheState, DEFAULT_FLUSH_THRESHOLD_BYTES};
use fluxstore_core::{OperType, Query, ColType, ValueType};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A collapsed view of one `colVal`'s records: live postings to add,
/// and tombstoned `uid`s to subtract from whatever a merge partner
/// (typically a TFile) holds for the same term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRecord {
    /// Ascending, deduplicated `uid`s whose newest record is `Add`/`Update`.
    pub postings: Vec<u64>,
    /// Ascending, deduplicated `uid`s whose newest record is `Del`.
    pub tombstones: Vec<u64>,
}

/// Per-`colVal` record bucket: every `(uid, operType)` write seen for
/// that value, in submission order, plus the column's `cVersion` at the
/// time this entry was first created.
struct Entry {
    records: Vec<(u64, OperType)>,
    created_at_version: u64,
}

/// Collapse `records` down to one `operType` per `uid` — the last write
/// wins, since `records` is in submission order.
fn collapse(records: &[(u64, OperType)]) -> CacheRecord {
    let mut newest: BTreeMap<u64, OperType> = BTreeMap::new();
    for &(uid, op) in records {
        newest.insert(uid, op);
    }
    let mut out = CacheRecord::default();
    for (uid, op) in newest {
        match op {
            OperType::Add | OperType::Update => out.postings.push(uid),
            OperType::Del => out.tombstones.push(uid),
        }
    }
    out
}

/// Approximate heap footprint of one record, used for the flush-trigger
/// size counter: 8 bytes for the `uid`, 1 for the `operType` tag.
const RECORD_BYTES: usize = 9;

/// One column's in-memory write buffer (§4.4).
pub struct IndexCache {
    col_name: String,
    col_type: ColType,
    cversion: u64,
    entries: RwLock<BTreeMap<Vec<u8>, Entry>>,
    size_bytes: AtomicUsize,
    flush_threshold: usize,
    state: Mutex<CacheState>,
    refcount: AtomicUsize,
}

impl IndexCache {
    /// A fresh `Active` cache for `colName` at the index's current
    /// `cVersion`, starting with one ref held by its owning index.
    pub fn new(col_name: impl Into<String>, col_type: ColType, cversion: u64) -> Self {
        Self::with_flush_threshold(col_name, col_type, cversion, DEFAULT_FLUSH_THRESHOLD_BYTES)
    }

    /// Like [`Self::new`] with an explicit flush-trigger byte threshold.
    pub fn with_flush_threshold(
        col_name: impl Into<String>,
        col_type: ColType,
        cversion: u64,
        flush_threshold: usize,
    ) -> Self {
        Self {
            col_name: col_name.into(),
            col_type,
            cversion,
            entries: RwLock::new(BTreeMap::new()),
            size_bytes: AtomicUsize::new(0),
            flush_threshold,
            state: Mutex::new(CacheState::Active),
            refcount: AtomicUsize::new(1),
        }
    }

    /// Column this buffer belongs to.
    pub fn col_name(&self) -> &str {
        &self.col_name
    }

    /// Value type tag for this column.
    pub fn col_type(&self) -> ColType {
        self.col_type
    }

    /// `cVersion` captured when this cache was created.
    pub fn cversion(&self) -> u64 {
        self.cversion
    }

    /// Append one `(colVal, uid, operType)` write. Thread-safe: callers
    /// from multiple writer threads may call concurrently.
    pub fn put(&self, col_val: Vec<u8>, uid: u64, op: OperType) {
        let mut entries = self.entries.write();
        let entry = entries.entry(col_val.clone()).or_insert_with(|| Entry {
            records: Vec::new(),
            created_at_version: self.cversion,
        });
        entry.records.push((uid, op));
        drop(entries);
        self.size_bytes
            .fetch_add(col_val.len() + RECORD_BYTES, Ordering::Relaxed);
    }

    /// Current approximate byte footprint.
    pub fn byte_size(&self) -> usize {
        self.size_bytes.load(Ordering::Relaxed)
    }

    /// Whether this cache has grown past its flush threshold.
    pub fn should_flush(&self) -> bool {
        self.byte_size() > self.flush_threshold
    }

    /// Deterministic scan collapsing every matching `colVal` entry,
    /// newest `operType` per `uid` winning. Returns the union of live
    /// postings across matched entries, and [`ValueType::Deletion`] if
    /// at least one entry matched but nothing survived collapsing (every
    /// matched `uid` was tombstoned) — signaling the facade to skip
    /// consulting the TFile for this term.
    pub fn search(&self, query: &Query) -> (Vec<u64>, ValueType) {
        let entries = self.entries.read();
        let mut postings: Vec<u64> = Vec::new();
        let mut matched_any = false;
        for (col_val, entry) in entries.iter() {
            if !query.matches(col_val) {
                continue;
            }
            matched_any = true;
            let collapsed = collapse(&entry.records);
            postings.extend(collapsed.postings);
        }
        postings.sort_unstable();
        postings.dedup();
        let value_type = if matched_any && postings.is_empty() {
            ValueType::Deletion
        } else {
            ValueType::Normal
        };
        (postings, value_type)
    }

    /// Snapshot every entry into a lazily-consumed, one-shot iterator in
    /// ascending `colVal` order — the flush algorithm's `C` input.
    pub fn iterator(&self) -> CacheIter {
        let entries = self.entries.read();
        let snapshot: Vec<(Vec<u8>, CacheRecord)> = entries
            .iter()
            .map(|(col_val, entry)| (col_val.clone(), collapse(&entry.records)))
            .collect();
        CacheIter {
            items: snapshot.into_iter(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CacheState {
        *self.state.lock()
    }

    /// Freeze this cache: no further writes are expected (the owner has
    /// already swapped in a fresh `Active` cache); a flush will drain it.
    pub fn mark_immutable(&self) {
        *self.state.lock() = CacheState::Immutable;
    }

    /// Take a new reference, returning the refcount after incrementing.
    pub fn add_ref(&self) -> usize {
        self.refcount.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Release a reference. If this was the last one and the cache was
    /// already `Immutable` (its flush has run), transitions it to
    /// `Discarded` and returns `true`.
    pub fn unref(&self) -> bool {
        let remaining = self.refcount.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining == 0 {
            let mut state = self.state.lock();
            if *state == CacheState::Immutable {
                *state = CacheState::Discarded;
                tracing::debug!(col_name = %self.col_name, "index cache discarded");
                return true;
            }
        }
        false
    }
}

/// One-shot iterator over a cache's collapsed entries in `colVal` order.
pub struct CacheIter {
    items: std::vec::IntoIter<(Vec<u8>, CacheRecord)>,
}

impl Iterator for CacheIter {
    type Item = (Vec<u8>, CacheRecord);

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_search_finds_the_uid() {
        let cache = IndexCache::new("k", ColType::Binary, 1);
        cache.put(b"a".to_vec(), 1, OperType::Add);
        cache.put(b"a".to_vec(), 2, OperType::Add);
        let (postings, vt) = cache.search(&Query::Eq(b"a".to_vec()));
        assert_eq!(postings, vec![1, 2]);
        assert_eq!(vt, ValueType::Normal);
    }

    #[test]
    fn delete_after_add_collapses_to_deletion() {
        let cache = IndexCache::new("k", ColType::Binary, 1);
        cache.put(b"a".to_vec(), 1, OperType::Add);
        cache.put(b"a".to_vec(), 1, OperType::Del);
        let (postings, vt) = cache.search(&Query::Eq(b"a".to_vec()));
        assert!(postings.is_empty());
        assert_eq!(vt, ValueType::Deletion);
    }

    #[test]
    fn newest_op_wins_regardless_of_order() {
        let cache = IndexCache::new("k", ColType::Binary, 1);
        cache.put(b"a".to_vec(), 1, OperType::Del);
        cache.put(b"a".to_vec(), 1, OperType::Add);
        let (postings, _) = cache.search(&Query::Eq(b"a".to_vec()));
        assert_eq!(postings, vec![1]);
    }

    #[test]
    fn search_with_no_matching_entries_is_normal_and_empty() {
        let cache = IndexCache::new("k", ColType::Binary, 1);
        let (postings, vt) = cache.search(&Query::Eq(b"missing".to_vec()));
        assert!(postings.is_empty());
        assert_eq!(vt, ValueType::Normal);
    }

    #[test]
    fn iterator_yields_entries_in_colval_order_with_tombstones_split_out() {
        let cache = IndexCache::new("k", ColType::Binary, 1);
        cache.put(b"b".to_vec(), 2, OperType::Add);
        cache.put(b"a".to_vec(), 1, OperType::Add);
        cache.put(b"a".to_vec(), 5, OperType::Del);
        let items: Vec<_> = cache.iterator().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, b"a".to_vec());
        assert_eq!(items[0].1.postings, vec![1]);
        assert_eq!(items[0].1.tombstones, vec![5]);
        assert_eq!(items[1].0, b"b".to_vec());
    }

    #[test]
    fn flush_threshold_trips_once_byte_size_exceeds_it() {
        let cache = IndexCache::with_flush_threshold("k", ColType::Binary, 1, 10);
        assert!(!cache.should_flush());
        for uid in 0..5 {
            cache.put(b"a".to_vec(), uid, OperType::Add);
        }
        assert!(cache.should_flush());
    }

    #[test]
    fn refcount_discards_only_once_immutable_and_unreffed_to_zero() {
        let cache = IndexCache::new("k", ColType::Binary, 1);
        assert_eq!(cache.add_ref(), 2);
        assert!(!cache.unref());
        assert_eq!(cache.state(), CacheState::Active);
        cache.mark_immutable();
        assert!(cache.unref());
        assert_eq!(cache.state(), CacheState::Discarded);
    }
}
