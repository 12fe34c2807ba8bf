//! # Fluxstore
//!
//! Per-operator state storage and a column inverted-index engine for a
//! streaming time-series database.
//!
//! Fluxstore is two independent subsystems sharing one ordered-KV
//! foundation and one error type:
//!
//! - [`StreamState`]: transactional per-operator window/session state —
//!   interval windows, fill windows, session windows, state-function
//!   tuples, and partition name/tag side tables — scoped by `opNum` and
//!   navigated with forward/backward cursors.
//! - [`IndexFacade`]: a two-tier (in-memory cache + immutable on-disk
//!   TFile segment) inverted index over tag columns, queried with
//!   boolean `MUST`/`SHOULD`/`NOT` combinations of per-term postings.
//!
//! Internal crates (`fluxstore-keycodec`, `fluxstore-kvstore`,
//! `fluxstore-indexcache`, `fluxstore-tfile`) are not re-exported
//! wholesale; only the public surface below is stable.
//!
//! # Quick start — stream state
//!
//! ```
//! use fluxstore::{BackendKind, StreamState, StreamStateOptions};
//! use fluxstore_keycodec::WinKey;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let opts = StreamStateOptions::new(dir.path(), "task-1").with_backend(BackendKind::Lsm);
//! let state = StreamState::open(opts).unwrap();
//! state.set_number(1);
//!
//! state.put(WinKey { ts: 5, group_id: 1 }, b"A").unwrap();
//! assert_eq!(state.get(WinKey { ts: 5, group_id: 1 }).unwrap(), Some(b"A".to_vec()));
//! state.commit().unwrap();
//! ```
//!
//! # Quick start — inverted index
//!
//! ```
//! use fluxstore::{BoolOp, ColType, IndexEngineOptions, IndexFacade, OperType, Query, Term};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let index = IndexFacade::open(dir.path(), 1, IndexEngineOptions::default()).unwrap();
//! index.put(&Term {
//!     col_name: "device_id".into(),
//!     col_type: ColType::Binary,
//!     col_val: b"sensor-7".to_vec(),
//!     op_type: OperType::Add,
//!     suid: 1,
//!     uid: 10,
//! }).unwrap();
//!
//! let hits = index
//!     .search(&[("device_id".to_string(), Query::Eq(b"sensor-7".to_vec()))], BoolOp::Must)
//!     .unwrap();
//! assert_eq!(hits, vec![10]);
//! ```

pub use fluxstore_core::{
    BoolOp, ColType, Error, OperType, Query, Result, StatusCode, Term, ValueType,
};
pub use fluxstore_indexengine::{IndexEngineOptions, IndexFacade, MultiTermQuery};
pub use fluxstore_statestore::{BackendKind, PageConfig, StateCursor, StreamState, StreamStateOptions};
