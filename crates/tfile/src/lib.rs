//! Immutable on-disk inverted-index segments ("TFiles", §4.5).
//!
//! A TFile holds, for one `(suid, colName)` pair, a sorted set of terms
//! each mapped to an ascending `uid` posting list. Segments are written
//! once by [`TFileWriter`] and never mutated in place; [`TFileReader`]
//! opens one (mmap-backed) for point, prefix, and range lookups, and
//! [`ReaderCache`] tracks the newest reader per column so the facade in
//! `fluxstore-indexengine` can swap segments in after a flush without
//! disturbing in-flight searches.
//!
//! ```
//! use fluxstore_core::ColType;
//! use fluxstore_tfile::{TFileReader, TFileWriter};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let writer = TFileWriter::open(dir.path(), 1, "device_id", ColType::Binary).unwrap();
//! let path = writer.put(1, vec![(b"sensor-7".to_vec(), vec![10, 11])], false).unwrap();
//!
//! let reader = TFileReader::open(&path).unwrap();
//! assert_eq!(reader.postings_for_term(b"sensor-7"), Some(vec![10, 11]));
//! ```

#![warn(missing_docs)]

mod format;
mod reader;
mod reader_cache;
mod writer;

pub use format::{segment_filename, Header};
pub use reader::{TFileReader, TermIter};
pub use reader_cache::ReaderCache;
pub use writer::TFileWriter;
