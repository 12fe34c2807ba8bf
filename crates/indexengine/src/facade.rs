//! Index Facade (§4.6): per-column cache/reader orchestration — `put`
//! (through the cache, triggering a flush once the cache crosses its
//! threshold), `delete` (a tombstoning write through the same path),
//! `search` (cache ∪ TFile per term, combined by a [`BoolOp`]), and
//! `rebuild` (force every column's cache and current segment through the
//! merge algorithm into a fresh version, installed atomically).

use crate::combine::combine;
use crate::config::IndexEngineOptions;
use crate::flusher::BackgroundFlusher;
use crate::merge::merge_cache_and_segment;
use fluxstore_core::{BoolOp, ColType, Error, OperType, Query, Result, Term, ValueType};
use fluxstore_indexcache::IndexCache;
use fluxstore_tfile::{ReaderCache, TFileReader, TFileWriter};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

struct ColumnState {
    cache: Arc<IndexCache>,
    col_type: ColType,
    version: u32,
    next_cversion: u64,
    flushing: bool,
}

/// Per-`suid` inverted-index facade over a directory of `.tfile`
/// segments plus their in-memory write buffers.
pub struct IndexFacade {
    dir: PathBuf,
    suid: i64,
    columns: Mutex<HashMap<String, ColumnState>>,
    reader_cache: Arc<ReaderCache>,
    flusher: Arc<BackgroundFlusher>,
    options: IndexEngineOptions,
}

impl IndexFacade {
    /// Open (creating if absent) the index directory for `suid`.
    pub fn open(dir: impl Into<PathBuf>, suid: i64, options: IndexEngineOptions) -> Result<Arc<Self>> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        let flusher = Arc::new(BackgroundFlusher::new(options.flusher_threads, options.flush_queue_depth));
        Ok(Arc::new(Self {
            dir,
            suid,
            columns: Mutex::new(HashMap::new()),
            reader_cache: Arc::new(ReaderCache::new()),
            flusher,
            options,
        }))
    }

    /// Stop accepting new flush jobs and join the Background Flusher's
    /// worker threads once the queue drains.
    pub fn close(&self) -> Result<()> {
        self.flusher.shutdown();
        Ok(())
    }

    /// Write one `(colName, colVal, uid, operType)` fact through the
    /// per-column cache. Triggers an asynchronous flush once the
    /// column's cache crosses its byte threshold, unless a flush for
    /// that column is already in flight.
    pub fn put(self: &Arc<Self>, term: &Term) -> Result<()> {
        let (should_flush, col_name) = {
            let mut columns = self.columns.lock();
            let state = columns.entry(term.col_name.clone()).or_insert_with(|| ColumnState {
                cache: Arc::new(IndexCache::with_flush_threshold(
                    term.col_name.clone(),
                    term.col_type,
                    0,
                    self.options.flush_threshold_bytes,
                )),
                col_type: term.col_type,
                version: 0,
                next_cversion: 1,
                flushing: false,
            });
            state.cache.put(term.col_val.clone(), term.uid, term.op_type);
            let trigger = state.cache.should_flush() && !state.flushing;
            if trigger {
                state.flushing = true;
            }
            (trigger, term.col_name.clone())
        };
        if should_flush {
            self.trigger_flush(col_name);
        }
        Ok(())
    }

    /// Tombstoning delete: a write through the cache with `operType =
    /// Del`, same path as [`Self::put`].
    pub fn delete(self: &Arc<Self>, col_name: &str, col_val: Vec<u8>, col_type: ColType, uid: u64) -> Result<()> {
        self.put(&Term {
            col_name: col_name.to_string(),
            col_type,
            col_val,
            op_type: OperType::Del,
            suid: self.suid,
            uid,
        })
    }

    /// Evaluate one term against its column's cache and installed TFile
    /// segment, returning the union of both unless the cache's collapsed
    /// result says this `colVal` is fully deleted (in which case the
    /// TFile is not consulted at all).
    fn search_one(&self, col_name: &str, query: &Query) -> Vec<u64> {
        let (cache, col_type) = {
            let columns = self.columns.lock();
            match columns.get(col_name) {
                Some(state) => (Arc::clone(&state.cache), state.col_type),
                None => return Vec::new(),
            }
        };

        let (cache_postings, value_type) = cache.search(query);
        if value_type == ValueType::Deletion {
            return cache_postings;
        }

        let mut merged: BTreeSet<u64> = cache_postings.into_iter().collect();
        if let Some(reader) = self.reader_cache.get(self.suid, col_name, col_type) {
            for (_, postings) in reader.search(query) {
                merged.extend(postings);
            }
        }
        merged.into_iter().collect()
    }

    /// Evaluate a multi-term query, combining each term's posting list
    /// with `op`.
    pub fn search(&self, terms: &[(String, Query)], op: BoolOp) -> Result<Vec<u64>> {
        let lists: Vec<Vec<u64>> = terms
            .iter()
            .map(|(col_name, query)| self.search_one(col_name, query))
            .collect();
        Ok(combine(op, &lists))
    }

    /// Evaluate a [`MultiTermQuery`](crate::MultiTermQuery).
    pub fn search_query(&self, query: &crate::MultiTermQuery) -> Result<Vec<u64>> {
        self.search(query.terms(), query.op())
    }

    /// Force every column's cache through the flush/merge algorithm
    /// immediately, bumping each to a fresh segment version.
    pub fn rebuild(&self) -> Result<()> {
        let col_names: Vec<String> = self.columns.lock().keys().cloned().collect();
        for col_name in col_names {
            self.flush_column(&col_name)?;
        }
        Ok(())
    }

    fn trigger_flush(self: &Arc<Self>, col_name: String) {
        let this = Arc::clone(self);
        let submitted = self.flusher.submit(move || {
            if let Err(err) = this.flush_column(&col_name) {
                tracing::error!(col_name = %col_name, error = %err, "flush failed, leaving prior segment in place");
                let mut columns = this.columns.lock();
                if let Some(state) = columns.get_mut(&col_name) {
                    state.flushing = false;
                }
            }
        });
        if submitted.is_err() {
            tracing::error!(col_name = %col_name, "flusher already shut down, dropping flush trigger");
        }
    }

    /// Run the §4.6 merge: swap in a fresh `Active` cache, merge the
    /// retired one against the currently-installed segment (if any),
    /// write the merged stream at `version + 1`, and install the new
    /// reader under the facade's lock.
    fn flush_column(&self, col_name: &str) -> Result<()> {
        let (old_cache, col_type, next_version) = {
            let mut columns = self.columns.lock();
            let state = columns
                .get_mut(col_name)
                .expect("flush triggered for a column with no cache registered");
            let fresh = Arc::new(IndexCache::with_flush_threshold(
                col_name.to_string(),
                state.col_type,
                state.next_cversion,
                self.options.flush_threshold_bytes,
            ));
            let old = std::mem::replace(&mut state.cache, fresh);
            old.mark_immutable();
            state.next_cversion += 1;
            (old, state.col_type, state.version + 1)
        };

        let cache_entries: Vec<_> = old_cache.iterator().collect();
        let existing_reader = self.reader_cache.get(self.suid, col_name, col_type);
        let segment_entries: Vec<(Vec<u8>, Vec<u64>)> = match &existing_reader {
            Some(reader) => reader.iter_terms().collect(),
            None => Vec::new(),
        };

        let merged = merge_cache_and_segment(cache_entries, segment_entries);

        let writer = TFileWriter::open(&self.dir, self.suid, col_name, col_type)?;
        let path = writer.put(next_version, merged, true)?;
        let new_reader = Arc::new(TFileReader::open(&path)?);
        self.reader_cache.install(new_reader);
        drop(existing_reader);
        old_cache.unref();

        let mut columns = self.columns.lock();
        if let Some(state) = columns.get_mut(col_name) {
            state.version = next_version;
            state.flushing = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxstore_core::OperType;

    fn term(col_name: &str, val: &[u8], uid: u64, op: OperType) -> Term {
        Term {
            col_name: col_name.to_string(),
            col_type: ColType::Binary,
            col_val: val.to_vec(),
            op_type: op,
            suid: 1,
            uid,
        }
    }

    #[test]
    fn put_then_must_search_finds_both_uids() {
        let dir = tempfile::tempdir().unwrap();
        let idx = IndexFacade::open(dir.path(), 1, IndexEngineOptions::default()).unwrap();
        idx.put(&term("k", b"a", 1, OperType::Add)).unwrap();
        idx.put(&term("k", b"a", 2, OperType::Add)).unwrap();
        let hits = idx
            .search(&[("k".to_string(), Query::Eq(b"a".to_vec()))], BoolOp::Must)
            .unwrap();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn delete_removes_the_uid_from_search() {
        let dir = tempfile::tempdir().unwrap();
        let idx = IndexFacade::open(dir.path(), 1, IndexEngineOptions::default()).unwrap();
        idx.put(&term("k", b"a", 1, OperType::Add)).unwrap();
        idx.put(&term("k", b"a", 2, OperType::Add)).unwrap();
        idx.delete("k", b"a".to_vec(), ColType::Binary, 1).unwrap();
        let hits = idx
            .search(&[("k".to_string(), Query::Eq(b"a".to_vec()))], BoolOp::Must)
            .unwrap();
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn rebuild_survives_into_a_fresh_segment_and_reopened_cache() {
        let dir = tempfile::tempdir().unwrap();
        let idx = IndexFacade::open(dir.path(), 1, IndexEngineOptions::default()).unwrap();
        idx.put(&term("k", b"a", 1, OperType::Add)).unwrap();
        idx.put(&term("k", b"a", 2, OperType::Add)).unwrap();
        idx.delete("k", b"a".to_vec(), ColType::Binary, 1).unwrap();
        idx.rebuild().unwrap();
        let hits = idx
            .search(&[("k".to_string(), Query::Eq(b"a".to_vec()))], BoolOp::Must)
            .unwrap();
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn two_columns_combine_with_must_and_should() {
        let dir = tempfile::tempdir().unwrap();
        let idx = IndexFacade::open(dir.path(), 1, IndexEngineOptions::default()).unwrap();
        idx.put(&term("k1", b"x", 1, OperType::Add)).unwrap();
        idx.put(&term("k1", b"x", 2, OperType::Add)).unwrap();
        idx.put(&term("k2", b"y", 2, OperType::Add)).unwrap();
        idx.put(&term("k2", b"y", 3, OperType::Add)).unwrap();

        let must = idx
            .search(
                &[
                    ("k1".to_string(), Query::Eq(b"x".to_vec())),
                    ("k2".to_string(), Query::Eq(b"y".to_vec())),
                ],
                BoolOp::Must,
            )
            .unwrap();
        assert_eq!(must, vec![2]);

        let should = idx
            .search(
                &[
                    ("k1".to_string(), Query::Eq(b"x".to_vec())),
                    ("k2".to_string(), Query::Eq(b"y".to_vec())),
                ],
                BoolOp::Should,
            )
            .unwrap();
        assert_eq!(should, vec![1, 2, 3]);
    }

    #[test]
    fn search_on_an_unknown_column_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let idx = IndexFacade::open(dir.path(), 1, IndexEngineOptions::default()).unwrap();
        let hits = idx
            .search(&[("missing".to_string(), Query::Eq(b"a".to_vec()))], BoolOp::Must)
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn cache_threshold_forces_a_flush_search_still_finds_the_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = IndexEngineOptions::default();
        opts.flush_threshold_bytes = 1;
        let idx = IndexFacade::open(dir.path(), 1, opts).unwrap();
        idx.put(&term("k", b"a", 2, OperType::Add)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(150));
        let hits = idx
            .search(&[("k".to_string(), Query::Eq(b"a".to_vec()))], BoolOp::Must)
            .unwrap();
        assert_eq!(hits, vec![2]);
        idx.close().unwrap();
    }
}
