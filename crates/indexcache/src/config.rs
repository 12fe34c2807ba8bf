//! Sizing constants for the per-column write buffer (§4.4).

/// Byte footprint above which a cache signals its owner to flush. Not
/// given a literal value by the system this was distilled from (which
/// sizes its equivalent buffer in row count, not bytes); chosen as a
/// round figure suited to an in-memory `Vec`/`BTreeMap`-backed buffer.
pub const DEFAULT_FLUSH_THRESHOLD_BYTES: usize = 4 * 1024 * 1024;

/// Lifecycle of one column's write buffer (§4.4): `Active` accepts
/// writes; `Immutable` is frozen for a flush in progress but still
/// servable to readers that hold a ref; `Discarded` means the flush
/// completed and the last ref was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Accepting writes.
    Active,
    /// Frozen; being drained by a flush, still readable.
    Immutable,
    /// Flushed and fully released; no longer reachable from the index.
    Discarded,
}
