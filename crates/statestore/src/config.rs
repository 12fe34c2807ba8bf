//! On-disk layout and page configuration for one operator task's state
//! directory (§6): `{base}/{taskId}/` holding one file per keyspace plus a
//! two-line `cfg` text file, mirroring `streamStateOpen`'s
//! `%d\n%d\n` page-size/page-count format and its default-on-missing-file
//! behavior.

use fluxstore_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default page size, bytes. Matches `streamStateOpen`'s built-in default.
pub const DEFAULT_PAGE_SIZE: u32 = 4096;
/// Default page count. Matches `streamStateOpen`'s built-in default.
pub const DEFAULT_PAGE_COUNT: u32 = 256;

/// Which `KvBackend` implementation a store is opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Explicit buffered transactions (`fluxstore_kvstore::BTreeBackend`).
    BTree,
    /// Immediately-visible writes (`fluxstore_kvstore::LsmBackend`).
    Lsm,
}

/// Page-layout configuration, persisted alongside a task's state files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    /// Page size in bytes.
    pub page_size: u32,
    /// Number of pages held in the backend's cache.
    pub page_count: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_count: DEFAULT_PAGE_COUNT,
        }
    }
}

impl PageConfig {
    /// Render the two-line `cfg` text format.
    fn render(&self) -> String {
        format!("{}\n{}\n", self.page_size, self.page_count)
    }

    /// Parse the two-line `cfg` text format.
    fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let page_size: u32 = lines
            .next()
            .ok_or_else(|| Error::Corruption("cfg file missing page size line".into()))?
            .trim()
            .parse()
            .map_err(|_| Error::Corruption("cfg file page size is not an integer".into()))?;
        let page_count: u32 = lines
            .next()
            .ok_or_else(|| Error::Corruption("cfg file missing page count line".into()))?
            .trim()
            .parse()
            .map_err(|_| Error::Corruption("cfg file page count is not an integer".into()))?;
        Ok(Self {
            page_size,
            page_count,
        })
    }
}

/// Options for opening a [`crate::StreamState`].
#[derive(Debug, Clone)]
pub struct StreamStateOptions {
    /// Directory under which every task gets its own subdirectory.
    pub base_dir: PathBuf,
    /// Stream task this store belongs to; its subdirectory is
    /// `{base_dir}/{task_id}/`.
    pub task_id: String,
    /// Which backend implementation to open the task directory with.
    pub backend: BackendKind,
    /// Page layout to persist on first open, or to validate against on
    /// reopen of an existing directory.
    pub page_config: PageConfig,
}

impl StreamStateOptions {
    /// Build options for `task_id` under `base_dir`, using the default page
    /// configuration and a `BTree` backend.
    pub fn new(base_dir: impl Into<PathBuf>, task_id: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            task_id: task_id.into(),
            backend: BackendKind::BTree,
            page_config: PageConfig::default(),
        }
    }

    /// Override the backend kind.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Override the page configuration.
    pub fn with_page_config(mut self, page_config: PageConfig) -> Self {
        self.page_config = page_config;
        self
    }

    pub(crate) fn task_dir(&self) -> PathBuf {
        self.base_dir.join(&self.task_id)
    }
}

/// Ensure `{base}/{taskId}/` exists and its `cfg` file is present, creating
/// it with `page_config` if this is a fresh directory. Returns the
/// configuration actually on disk (the caller's `page_config` is ignored on
/// reopen, just as `streamStateOpen` keeps whatever was written previously).
pub(crate) fn ensure_task_dir(dir: &Path, page_config: PageConfig) -> Result<PageConfig> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let cfg_path = dir.join("cfg");
    if cfg_path.exists() {
        let text = fs::read_to_string(&cfg_path).map_err(|e| Error::io(&cfg_path, e))?;
        PageConfig::parse(&text)
    } else {
        fs::write(&cfg_path, page_config.render()).map_err(|e| Error::io(&cfg_path, e))?;
        Ok(page_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_config_matches_documented_defaults() {
        let cfg = PageConfig::default();
        assert_eq!(cfg.page_size, 4096);
        assert_eq!(cfg.page_count, 256);
    }

    #[test]
    fn render_and_parse_roundtrip() {
        let cfg = PageConfig {
            page_size: 8192,
            page_count: 64,
        };
        assert_eq!(PageConfig::parse(&cfg.render()).unwrap(), cfg);
    }

    #[test]
    fn fresh_directory_gets_cfg_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let task_dir = dir.path().join("task-1");
        let cfg = ensure_task_dir(&task_dir, PageConfig::default()).unwrap();
        assert_eq!(cfg, PageConfig::default());
        assert!(task_dir.join("cfg").exists());
    }

    #[test]
    fn reopen_keeps_existing_cfg_over_new_default() {
        let dir = tempfile::tempdir().unwrap();
        let task_dir = dir.path().join("task-1");
        ensure_task_dir(
            &task_dir,
            PageConfig {
                page_size: 1024,
                page_count: 16,
            },
        )
        .unwrap();
        let cfg = ensure_task_dir(&task_dir, PageConfig::default()).unwrap();
        assert_eq!(
            cfg,
            PageConfig {
                page_size: 1024,
                page_count: 16
            }
        );
    }
}
