//! The `StreamState` facade: one instance per stream task, holding the six
//! opNum- or groupId-scoped keyspaces described in §3.1 and the
//! always-writable transaction loop described in §4.3.

use crate::config::{ensure_task_dir, BackendKind, PageConfig, StreamStateOptions};
use fluxstore_core::{Error, Result};
use fluxstore_kvstore::{BTreeBackend, ByteComparator, KeyspaceId, KvBackend, LsmBackend, OpenOptions, Txn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI32, Ordering as AtomicOrdering};
use std::sync::Arc;

pub(crate) const STATE_KS: &str = "state.db";
pub(crate) const FILL_KS: &str = "fill.state.db";
pub(crate) const SESSION_KS: &str = "session.state.db";
pub(crate) const FUNC_KS: &str = "func.state.db";
pub(crate) const PARNAME_KS: &str = "parname.state.db";
pub(crate) const PARTAG_KS: &str = "partag.state.db";

/// Lifecycle status of a [`StreamState`]. `TxnActive` covers the entire
/// `OPEN ⇄ COMMITTED/ABORTED` loop (§4.3): every `commit`/`abort` leaves a
/// fresh transaction open immediately, so from a caller's perspective the
/// store is either live (`TxnActive`) or permanently done (`Closed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    TxnActive,
    Closed,
}

pub(crate) struct Keyspaces {
    pub(crate) state: KeyspaceId,
    pub(crate) fill: KeyspaceId,
    pub(crate) session: KeyspaceId,
    pub(crate) func: KeyspaceId,
    pub(crate) parname: KeyspaceId,
    pub(crate) partag: KeyspaceId,
}

/// Per-operator stream state store: interval-window, fill, session,
/// state-function, and par-name/par-tag keyspaces over one ordered KV
/// backend, scoped to an `opNum` the caller sets with [`StreamState::set_number`].
pub struct StreamState {
    pub(crate) backend: Arc<dyn KvBackend>,
    pub(crate) keyspaces: Keyspaces,
    pub(crate) op_num: AtomicI32,
    status: Mutex<Status>,
    txn: Mutex<Option<Txn>>,
    #[allow(dead_code)]
    page_config: PageConfig,
}

impl StreamState {
    /// Open (or reopen) a stream state store per `opts`, creating its task
    /// directory and `cfg` file if this is the first open.
    pub fn open(opts: StreamStateOptions) -> Result<Self> {
        let task_dir = opts.task_dir();
        let page_config = ensure_task_dir(&task_dir, opts.page_config)?;

        let backend: Arc<dyn KvBackend> = match opts.backend {
            BackendKind::BTree => Arc::new(BTreeBackend::open(OpenOptions::new(&task_dir))?),
            BackendKind::Lsm => Arc::new(LsmBackend::open(OpenOptions::new(&task_dir))?),
        };

        let keyspaces = Keyspaces {
            state: backend.register_keyspace(STATE_KS, Arc::new(ByteComparator))?,
            fill: backend.register_keyspace(FILL_KS, Arc::new(ByteComparator))?,
            session: backend.register_keyspace(SESSION_KS, Arc::new(ByteComparator))?,
            func: backend.register_keyspace(FUNC_KS, Arc::new(ByteComparator))?,
            parname: backend.register_keyspace(PARNAME_KS, Arc::new(ByteComparator))?,
            partag: backend.register_keyspace(PARTAG_KS, Arc::new(ByteComparator))?,
        };

        let txn = backend.begin()?;
        tracing::debug!(task = %opts.task_id, "stream state store opened");

        Ok(Self {
            backend,
            keyspaces,
            op_num: AtomicI32::new(0),
            status: Mutex::new(Status::TxnActive),
            txn: Mutex::new(Some(txn)),
            page_config,
        })
    }

    /// Set the operator number every subsequent window/session operation is
    /// scoped to.
    pub fn set_number(&self, op_num: i32) {
        self.op_num.store(op_num, AtomicOrdering::Relaxed);
    }

    /// The operator number currently in scope.
    pub fn op_num(&self) -> i32 {
        self.op_num.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if *self.status.lock() == Status::Closed {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Borrow the current transaction. Panics only if called after
    /// [`StreamState::close`], which callers can't do without first
    /// observing [`Error::Closed`] from [`StreamState::check_open`].
    pub(crate) fn with_txn<T>(&self, f: impl FnOnce(&Txn) -> Result<T>) -> Result<T> {
        self.check_open()?;
        let guard = self.txn.lock();
        let txn = guard.as_ref().expect("txn present while store is open");
        f(txn)
    }

    /// Commit the current transaction and immediately open a fresh one, so
    /// the store remains writable (§4.3's `OPEN → TXN_ACTIVE ⇄ COMMITTED →
    /// TXN_ACTIVE` loop).
    pub fn commit(&self) -> Result<()> {
        self.check_open()?;
        let mut guard = self.txn.lock();
        let txn = guard.take().expect("txn present while store is open");
        self.backend.commit(txn)?;
        *guard = Some(self.backend.begin()?);
        Ok(())
    }

    /// Abort the current transaction, discarding its writes, and
    /// immediately open a fresh one.
    pub fn abort(&self) -> Result<()> {
        self.check_open()?;
        let mut guard = self.txn.lock();
        let txn = guard.take().expect("txn present while store is open");
        self.backend.abort(txn)?;
        *guard = Some(self.backend.begin()?);
        Ok(())
    }

    /// Commit any pending writes and transition to `Closed`. Every
    /// subsequent operation returns [`Error::Closed`].
    pub fn close(&self) -> Result<()> {
        let mut status = self.status.lock();
        if *status == Status::Closed {
            return Ok(());
        }
        let mut guard = self.txn.lock();
        if let Some(txn) = guard.take() {
            self.backend.commit(txn)?;
        }
        *status = Status::Closed;
        Ok(())
    }

    /// Delete every interval-window and session entry scoped to the
    /// current `opNum` (the two opNum-scoped keyspaces; fill, func, and
    /// par-name/par-tag are not opNum-scoped and are left untouched).
    pub fn clear(&self) -> Result<()> {
        self.check_open()?;
        let op_num = self.op_num();
        self.clear_state_keyspace(op_num)?;
        self.clear_session_keyspace(op_num)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamStateOptions;

    fn open_store(dir: &std::path::Path) -> StreamState {
        StreamState::open(StreamStateOptions::new(dir, "task-1")).unwrap()
    }

    #[test]
    fn open_creates_cfg_and_registers_keyspaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        assert!(dir.path().join("task-1").join("cfg").exists());
        assert_eq!(store.op_num(), 0);
    }

    #[test]
    fn set_number_changes_scope() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store.set_number(7);
        assert_eq!(store.op_num(), 7);
    }

    #[test]
    fn closed_store_rejects_further_operations() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store.close().unwrap();
        assert!(matches!(store.commit(), Err(Error::Closed)));
        assert!(matches!(store.clear(), Err(Error::Closed)));
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store.close().unwrap();
        store.close().unwrap();
    }
}
