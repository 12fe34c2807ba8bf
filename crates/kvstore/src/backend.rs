//! Concrete `KvBackend` implementations.
//!
//! [`BTreeBackend`] buffers writes in an explicit transaction and applies
//! them atomically on commit. [`LsmBackend`] applies every write the
//! instant it's issued; its `begin`/`commit`/`abort` are no-ops, matching
//! the MVCC-like backend the spec permits as an alternative (§4.2). Both
//! share the same sorted-vector [`Keyspace`](crate::keyspace::Keyspace)
//! storage — the difference is entirely in how writes become visible.

use crate::comparator::SharedComparator;
use crate::cursor::Cursor;
use crate::keyspace::{Keyspace, KeyspaceId};
use fluxstore_core::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Options controlling how a backend opens its on-disk directory.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Base directory for the backend's files; created if missing.
    pub path: PathBuf,
}

impl OpenOptions {
    /// Build options for the given directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

enum WriteOp {
    Upsert {
        ks: KeyspaceId,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        ks: KeyspaceId,
        key: Vec<u8>,
    },
}

/// A write-ahead transaction handle.
///
/// On [`BTreeBackend`], writes issued against a `Txn` are buffered here and
/// applied to the keyspaces only on `commit`. On [`LsmBackend`] the buffer
/// is unused — writes apply immediately regardless of which `Txn` (if any)
/// is supplied.
pub struct Txn {
    id: u64,
    pending: Mutex<Vec<WriteOp>>,
}

impl Txn {
    fn new(id: u64) -> Self {
        Self {
            id,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The transaction's identifier, stable for its lifetime.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Abstract ordered KV backend capability set (§4.2).
pub trait KvBackend: Send + Sync {
    /// Register a new keyspace with the given comparator. Idempotent by
    /// name: calling again with the same name returns the existing handle.
    fn register_keyspace(&self, name: &str, comparator: SharedComparator) -> Result<KeyspaceId>;

    /// Begin a new transaction.
    fn begin(&self) -> Result<Txn>;

    /// Commit a transaction, making its writes visible.
    fn commit(&self, txn: Txn) -> Result<()>;

    /// Abort a transaction, discarding its writes.
    fn abort(&self, txn: Txn) -> Result<()>;

    /// Write `key => value` into `ks`, scoped to `txn`.
    fn upsert(&self, ks: KeyspaceId, txn: &Txn, key: &[u8], value: &[u8]) -> Result<()>;

    /// Read the latest committed value for `key` in `ks`.
    fn get(&self, ks: KeyspaceId, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Delete `key` from `ks`, scoped to `txn`.
    fn delete(&self, ks: KeyspaceId, txn: &Txn, key: &[u8]) -> Result<()>;

    /// Open a cursor over `ks`. If `txn` is supplied, the cursor observes
    /// that transaction's buffered writes layered over the committed
    /// snapshot (`BTreeBackend`) or simply the live data (`LsmBackend`,
    /// where there is nothing to layer).
    fn open_cursor(&self, ks: KeyspaceId, txn: Option<&Txn>) -> Result<Cursor>;
}

struct KeyspaceRegistry {
    by_name: RwLock<std::collections::HashMap<String, KeyspaceId>>,
    keyspaces: RwLock<Vec<Arc<Keyspace>>>,
}

impl KeyspaceRegistry {
    fn new() -> Self {
        Self {
            by_name: RwLock::new(std::collections::HashMap::new()),
            keyspaces: RwLock::new(Vec::new()),
        }
    }

    fn register(&self, name: &str, comparator: SharedComparator) -> KeyspaceId {
        if let Some(id) = self.by_name.read().get(name) {
            return *id;
        }
        let mut by_name = self.by_name.write();
        if let Some(id) = by_name.get(name) {
            return *id;
        }
        let mut keyspaces = self.keyspaces.write();
        let id = KeyspaceId(keyspaces.len() as u32);
        keyspaces.push(Arc::new(Keyspace::new(name.to_string(), comparator)));
        by_name.insert(name.to_string(), id);
        id
    }

    fn get(&self, id: KeyspaceId) -> Result<Arc<Keyspace>> {
        self.keyspaces
            .read()
            .get(id.0 as usize)
            .cloned()
            .ok_or_else(|| Error::InvalidArgument(format!("unknown keyspace id {:?}", id)))
    }
}

/// Embedded B-tree-style backend with explicit, buffered transactions.
///
/// Writes issued through a `Txn` are invisible to other readers (and other
/// transactions) until [`KvBackend::commit`] is called, at which point they
/// are applied as a single atomic batch.
pub struct BTreeBackend {
    #[allow(dead_code)]
    path: PathBuf,
    registry: KeyspaceRegistry,
    next_txn_id: AtomicU64,
}

impl BTreeBackend {
    /// Open (creating if necessary) a B-tree backend rooted at `opts.path`.
    pub fn open(opts: OpenOptions) -> Result<Self> {
        ensure_dir(&opts.path)?;
        Ok(Self {
            path: opts.path,
            registry: KeyspaceRegistry::new(),
            next_txn_id: AtomicU64::new(1),
        })
    }
}

impl KvBackend for BTreeBackend {
    fn register_keyspace(&self, name: &str, comparator: SharedComparator) -> Result<KeyspaceId> {
        Ok(self.registry.register(name, comparator))
    }

    fn begin(&self) -> Result<Txn> {
        let id = self.next_txn_id.fetch_add(1, AtomicOrdering::Relaxed);
        Ok(Txn::new(id))
    }

    fn commit(&self, txn: Txn) -> Result<()> {
        let pending = txn.pending.into_inner();
        for op in pending {
            match op {
                WriteOp::Upsert { ks, key, value } => {
                    self.registry.get(ks)?.upsert(key, value);
                }
                WriteOp::Delete { ks, key } => {
                    self.registry.get(ks)?.delete(&key);
                }
            }
        }
        Ok(())
    }

    fn abort(&self, txn: Txn) -> Result<()> {
        drop(txn);
        Ok(())
    }

    fn upsert(&self, ks: KeyspaceId, txn: &Txn, key: &[u8], value: &[u8]) -> Result<()> {
        self.registry.get(ks)?; // validates the keyspace exists
        txn.pending.lock().push(WriteOp::Upsert {
            ks,
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    fn get(&self, ks: KeyspaceId, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.registry.get(ks)?.get(key))
    }

    fn delete(&self, ks: KeyspaceId, txn: &Txn, key: &[u8]) -> Result<()> {
        self.registry.get(ks)?;
        txn.pending.lock().push(WriteOp::Delete {
            ks,
            key: key.to_vec(),
        });
        Ok(())
    }

    fn open_cursor(&self, ks: KeyspaceId, txn: Option<&Txn>) -> Result<Cursor> {
        let keyspace = self.registry.get(ks)?;
        let mut snapshot = keyspace.snapshot();
        if let Some(txn) = txn {
            apply_pending_to_snapshot(&mut snapshot, &txn.pending.lock(), ks, keyspace.comparator.as_ref());
        }
        Ok(Cursor::new(snapshot, keyspace.comparator.clone()))
    }
}

fn apply_pending_to_snapshot(
    snapshot: &mut Vec<(Vec<u8>, Vec<u8>)>,
    pending: &[WriteOp],
    ks: KeyspaceId,
    comparator: &dyn crate::Comparator,
) {
    for op in pending {
        match op {
            WriteOp::Upsert { ks: op_ks, key, value } if *op_ks == ks => {
                match snapshot.binary_search_by(|(k, _)| comparator.compare(k, key)) {
                    Ok(i) => snapshot[i].1 = value.clone(),
                    Err(i) => snapshot.insert(i, (key.clone(), value.clone())),
                }
            }
            WriteOp::Delete { ks: op_ks, key } if *op_ks == ks => {
                if let Ok(i) = snapshot.binary_search_by(|(k, _)| comparator.compare(k, key)) {
                    snapshot.remove(i);
                }
            }
            _ => {}
        }
    }
}

/// Embedded LSM-style backend: every write is immediately visible;
/// `begin`/`commit`/`abort` are bookkeeping no-ops, matching an engine
/// that relies on its own internal MVCC rather than explicit txn buffers.
pub struct LsmBackend {
    #[allow(dead_code)]
    path: PathBuf,
    registry: KeyspaceRegistry,
    next_txn_id: AtomicU64,
}

impl LsmBackend {
    /// Open (creating if necessary) an LSM backend rooted at `opts.path`.
    pub fn open(opts: OpenOptions) -> Result<Self> {
        ensure_dir(&opts.path)?;
        Ok(Self {
            path: opts.path,
            registry: KeyspaceRegistry::new(),
            next_txn_id: AtomicU64::new(1),
        })
    }
}

impl KvBackend for LsmBackend {
    fn register_keyspace(&self, name: &str, comparator: SharedComparator) -> Result<KeyspaceId> {
        Ok(self.registry.register(name, comparator))
    }

    fn begin(&self) -> Result<Txn> {
        let id = self.next_txn_id.fetch_add(1, AtomicOrdering::Relaxed);
        Ok(Txn::new(id))
    }

    fn commit(&self, _txn: Txn) -> Result<()> {
        Ok(())
    }

    fn abort(&self, _txn: Txn) -> Result<()> {
        Ok(())
    }

    fn upsert(&self, ks: KeyspaceId, _txn: &Txn, key: &[u8], value: &[u8]) -> Result<()> {
        self.registry.get(ks)?.upsert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, ks: KeyspaceId, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.registry.get(ks)?.get(key))
    }

    fn delete(&self, ks: KeyspaceId, _txn: &Txn, key: &[u8]) -> Result<()> {
        self.registry.get(ks)?.delete(key);
        Ok(())
    }

    fn open_cursor(&self, ks: KeyspaceId, _txn: Option<&Txn>) -> Result<Cursor> {
        let keyspace = self.registry.get(ks)?;
        Ok(Cursor::new(keyspace.snapshot(), keyspace.comparator.clone()))
    }
}
