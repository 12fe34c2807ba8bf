//! Background Flusher sizing (§4.7), named after `original_source`'s
//! `index.c` constants.

use fluxstore_indexcache::DEFAULT_FLUSH_THRESHOLD_BYTES;

/// Default fixed worker-pool size for the Background Flusher.
pub const DEFAULT_FLUSHER_THREADS: usize = 4;
/// Default bounded flush-queue depth; `submit` blocks the caller once full.
pub const DEFAULT_FLUSH_QUEUE_DEPTH: usize = 200;

/// Tunables for one [`crate::IndexFacade`] (§4.7, §6).
#[derive(Debug, Clone, Copy)]
pub struct IndexEngineOptions {
    /// Background Flusher worker-pool size.
    pub flusher_threads: usize,
    /// Background Flusher bounded queue depth.
    pub flush_queue_depth: usize,
    /// Per-column cache byte footprint that triggers a flush.
    pub flush_threshold_bytes: usize,
}

impl Default for IndexEngineOptions {
    fn default() -> Self {
        Self {
            flusher_threads: DEFAULT_FLUSHER_THREADS,
            flush_queue_depth: DEFAULT_FLUSH_QUEUE_DEPTH,
            flush_threshold_bytes: DEFAULT_FLUSH_THRESHOLD_BYTES,
        }
    }
}
