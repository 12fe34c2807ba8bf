//! Per-column in-memory write buffer for the inverted-index engine
//! (§4.4): [`IndexCache`] collects `(colVal, uid, operType)` writes
//! ahead of a flush, answers point/range searches against its own
//! unflushed state, and hands a one-shot snapshot iterator to the flush
//! merge in `fluxstore-indexengine`.
//!
//! ```
//! use fluxstore_core::{ColType, OperType, Query};
//! use fluxstore_indexcache::IndexCache;
//!
//! let cache = IndexCache::new("device_id", ColType::Binary, 1);
//! cache.put(b"sensor-7".to_vec(), 10, OperType::Add);
//! let (postings, _value_type) = cache.search(&Query::Eq(b"sensor-7".to_vec()));
//! assert_eq!(postings, vec![10]);
//! ```

#![warn(missing_docs)]

mod cache;
mod config;

pub use cache::{CacheIter, CacheRecord, IndexCache};
pub use config::{CacheState, DEFAULT_FLUSH_THRESHOLD_BYTES};
