//! Inverted-index facade and Background Flusher (§4.6, §4.7).
//!
//! [`IndexFacade`] owns one cache plus one installed `TFileReader` per
//! column, drives the two-input merge in [`merge`] when a cache crosses
//! its flush threshold, and evaluates multi-term queries through
//! [`combine`]'s true set `MUST`/`SHOULD`/`NOT` semantics.
//!
//! ```
//! use fluxstore_core::{BoolOp, ColType, OperType, Query, Term};
//! use fluxstore_indexengine::{IndexEngineOptions, IndexFacade};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let idx = IndexFacade::open(dir.path(), 1, IndexEngineOptions::default()).unwrap();
//! idx.put(&Term {
//!     col_name: "device_id".into(),
//!     col_type: ColType::Binary,
//!     col_val: b"sensor-7".to_vec(),
//!     op_type: OperType::Add,
//!     suid: 1,
//!     uid: 10,
//! }).unwrap();
//!
//! let hits = idx
//!     .search(&[("device_id".to_string(), Query::Eq(b"sensor-7".to_vec()))], BoolOp::Must)
//!     .unwrap();
//! assert_eq!(hits, vec![10]);
//! ```

#![warn(missing_docs)]

mod combine;
mod config;
mod facade;
mod flusher;
mod merge;
mod query;

pub use combine::combine;
pub use config::{IndexEngineOptions, DEFAULT_FLUSHER_THREADS, DEFAULT_FLUSH_QUEUE_DEPTH};
pub use facade::IndexFacade;
pub use flusher::BackgroundFlusher;
pub use merge::merge_cache_and_segment;
pub use query::MultiTermQuery;
