//! Abstract ordered key/value backend (§4.2).
//!
//! `KvBackend` is the capability set the stream state store and index
//! engine are built on: multi-keyspace, custom per-keyspace comparator,
//! a cursor with a defined seek contract, and an optional write-ahead
//! transaction. Two concrete backends are provided — [`BTreeBackend`],
//! with explicit `begin`/`commit`/`abort`, and [`LsmBackend`], where those
//! three degenerate to no-ops and every write is immediately visible. Both
//! implement [`KvBackend`] identically from the caller's point of view.

#![warn(missing_docs)]

pub mod backend;
pub mod comparator;
pub mod cursor;
pub mod keyspace;

pub use backend::{BTreeBackend, KvBackend, LsmBackend, OpenOptions, Txn};
pub use comparator::{ByteComparator, Comparator};
pub use cursor::{Cursor, SeekResult};
pub use keyspace::KeyspaceId;
