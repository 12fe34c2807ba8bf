//! Per-operator stream state store (§3, §4.3): typed facades over an
//! ordered KV backend for interval-window, fill, session, state-function,
//! and par-name/par-tag keyspaces, plus an always-writable transaction
//! loop and an `opNum`-scoped cursor walk.
//!
//! ```
//! use fluxstore_statestore::{StreamState, StreamStateOptions};
//! use fluxstore_keycodec::WinKey;
//!
//! # fn main() -> fluxstore_core::Result<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let store = StreamState::open(StreamStateOptions::new(dir.path(), "task-1"))?;
//! store.set_number(1);
//! store.put(WinKey::new(0, 42), b"payload")?;
//! assert_eq!(store.get(WinKey::new(0, 42))?, Some(b"payload".to_vec()));
//! store.commit()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod cursor;
mod func;
mod partag;
mod sessions;
mod state_window;
mod store;
mod windows;

pub use config::{BackendKind, PageConfig, StreamStateOptions};
pub use cursor::StateCursor;
pub use store::StreamState;
