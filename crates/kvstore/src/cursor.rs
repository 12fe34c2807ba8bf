//! Cursor over a keyspace snapshot.
//!
//! A cursor walks a stable snapshot taken when it was opened: writes that
//! land after the snapshot was taken are invisible to it, matching the
//! concurrency model in §5 ("a read in progress through a reader continues
//! to see that reader's snapshot until it releases").

use crate::comparator::SharedComparator;
use std::cmp::Ordering;

/// Outcome of [`Cursor::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekResult {
    /// The cursor landed on a key and `Ordering` compares that key to the
    /// key passed to `seek` (`positioned_key.cmp(seek_key)`).
    Positioned(Ordering),
    /// The keyspace snapshot is empty, or no key at-or-after `seek_key`
    /// exists; the cursor has no current position.
    Empty,
}

/// A snapshot cursor over one keyspace.
pub struct Cursor {
    data: Vec<(Vec<u8>, Vec<u8>)>,
    comparator: SharedComparator,
    /// `None` means "off the end" (before the first entry or after the
    /// last); `Some(i)` is a valid index into `data`.
    pos: Option<usize>,
}

impl Cursor {
    pub(crate) fn new(data: Vec<(Vec<u8>, Vec<u8>)>, comparator: SharedComparator) -> Self {
        Self {
            data,
            comparator,
            pos: None,
        }
    }

    /// Position at the smallest key that is `>= key`. Returns how that
    /// position compares to `key`, or [`SeekResult::Empty`] if none exists.
    pub fn seek(&mut self, key: &[u8]) -> SeekResult {
        match self
            .data
            .binary_search_by(|(k, _)| self.comparator.compare(k, key))
        {
            Ok(i) => {
                self.pos = Some(i);
                SeekResult::Positioned(Ordering::Equal)
            }
            Err(i) if i < self.data.len() => {
                self.pos = Some(i);
                SeekResult::Positioned(self.comparator.compare(&self.data[i].0, key))
            }
            Err(_) => {
                self.pos = None;
                SeekResult::Empty
            }
        }
    }

    /// Position at the smallest key in the snapshot.
    pub fn move_first(&mut self) {
        self.pos = if self.data.is_empty() { None } else { Some(0) };
    }

    /// Position at the largest key in the snapshot.
    pub fn move_last(&mut self) {
        self.pos = if self.data.is_empty() {
            None
        } else {
            Some(self.data.len() - 1)
        };
    }

    /// Step to the next key. Returns `true` if the cursor landed on a
    /// valid entry, `false` if it stepped off the end. Calling this again
    /// once `false` has been returned is a no-op that keeps returning
    /// `false` — it never panics or re-wraps.
    pub fn move_next(&mut self) -> bool {
        match self.pos {
            None => false,
            Some(i) if i + 1 < self.data.len() => {
                self.pos = Some(i + 1);
                true
            }
            Some(_) => {
                self.pos = None;
                false
            }
        }
    }

    /// Step to the previous key. See [`Cursor::move_next`] for the
    /// off-the-end contract.
    pub fn move_prev(&mut self) -> bool {
        match self.pos {
            None => false,
            Some(0) => {
                self.pos = None;
                false
            }
            Some(i) => {
                self.pos = Some(i - 1);
                true
            }
        }
    }

    /// The key/value pair at the current position, or `None` if the
    /// cursor is off the end.
    pub fn current(&self) -> Option<(&[u8], &[u8])> {
        self.pos.map(|i| {
            let (k, v) = &self.data[i];
            (k.as_slice(), v.as_slice())
        })
    }

    /// Whether the cursor currently has a valid position.
    pub fn is_valid(&self) -> bool {
        self.pos.is_some()
    }
}
