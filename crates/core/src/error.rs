//! Error types for the Fluxstore state store and index engine.
//!
//! `Error` is the single error type returned by every public operation in
//! the workspace. We use `thiserror` for `Display`/`std::error::Error`
//! plumbing, the same way the rest of the storage stack does.
//!
//! ## Error kinds
//!
//! Per the external-interface error codes: `NotFound`, `OutOfMemory`, `IO`,
//! `Corruption`, `InvalidArgument`, `OperatorMismatch`, `Closed`. The
//! recoverable/surfaced/fatal split is a calling-convention, not a type
//! distinction: `NotFound` is returned as `Ok(None)` wherever the API shape
//! allows it (gets, seeks), and only appears as an `Error` from operations
//! that have no "absent" return shape (e.g. deleting a required keyspace
//! row by cursor).

use std::io;
use std::path::PathBuf;

/// Result type alias used throughout Fluxstore.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the ordered KV backend, state store, and index engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested key, keyspace, or segment does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Allocation or on-disk capacity was exhausted.
    #[error("out of memory / out of space: {0}")]
    OutOfMemory(String),

    /// Underlying I/O failure (open, read, write, fsync, rename).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// Path the failing operation touched, if known.
        path: Option<PathBuf>,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// On-disk data failed a structural or checksum check.
    #[error("corruption: {0}")]
    Corruption(String),

    /// Caller-supplied argument is structurally invalid for the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A cursor or keyspace operation observed a key belonging to a
    /// different `opNum` than the one it was scoped to.
    #[error("operator mismatch: cursor scoped to opNum {expected}, observed {actual}")]
    OperatorMismatch {
        /// `opNum` the cursor/store was scoped to.
        expected: i32,
        /// `opNum` actually observed at the offending key.
        actual: i32,
    },

    /// The store or segment has already been closed.
    #[error("store is closed")]
    Closed,
}

impl Error {
    /// Build an [`Error::Io`] with a known path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Build an [`Error::Io`] without an associated path.
    pub fn io_bare(source: io::Error) -> Self {
        Error::Io { path: None, source }
    }

    /// Map this error onto the small integer status code exposed at the
    /// external interface boundary (§6).
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NotFound,
            Error::OutOfMemory(_) => StatusCode::OutOfMemory,
            Error::Io { .. } => StatusCode::Io,
            Error::Corruption(_) => StatusCode::Corruption,
            Error::InvalidArgument(_) => StatusCode::InvalidArgument,
            Error::OperatorMismatch { .. } => StatusCode::OperatorMismatch,
            Error::Closed => StatusCode::Closed,
        }
    }

    /// Whether this error is worth retrying the enclosing write (e.g. a
    /// flush job gets re-enqueued rather than dropped).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io { .. } | Error::OutOfMemory(_))
    }
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Error::io_bare(source)
    }
}

/// Small integer status code returned across the external interface (§6).
///
/// `Success` has no corresponding [`Error`] variant — callers represent
/// success as `Ok(..)`; this enum exists for code that needs to serialize
/// a status across a boundary that isn't `Result<T, Error>` itself (e.g.
/// a C-style status out-parameter in a future FFI layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Operation succeeded.
    Success,
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::OutOfMemory`].
    OutOfMemory,
    /// See [`Error::Io`].
    Io,
    /// See [`Error::Corruption`].
    Corruption,
    /// See [`Error::InvalidArgument`].
    InvalidArgument,
    /// See [`Error::OperatorMismatch`].
    OperatorMismatch,
    /// See [`Error::Closed`].
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_roundtrips_kind() {
        let err = Error::OperatorMismatch {
            expected: 1,
            actual: 2,
        };
        assert_eq!(err.status_code(), StatusCode::OperatorMismatch);
    }

    #[test]
    fn io_errors_are_retryable() {
        let err = Error::io_bare(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(err.is_retryable());
    }

    #[test]
    fn invalid_argument_is_not_retryable() {
        let err = Error::InvalidArgument("bad key".into());
        assert!(!err.is_retryable());
    }

    #[test]
    fn from_io_error_has_no_path() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        match err {
            Error::Io { path, .. } => assert!(path.is_none()),
            _ => panic!("expected Io variant"),
        }
    }
}
