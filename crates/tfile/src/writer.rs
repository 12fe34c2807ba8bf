//! `TFileWriter` (§4.5): builds one immutable segment file from a sorted
//! `(term, postings)` stream and writes it atomically.

use crate::format::{checksum, encode_footer, segment_filename, Header, FOOTER_SIZE};
use fluxstore_core::{ColType, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `.tfile` segments for one `(suid, colName)` pair into a
/// directory.
pub struct TFileWriter {
    dir: PathBuf,
    suid: i64,
    col_name: String,
    col_type: ColType,
}

impl TFileWriter {
    /// Open a writer rooted at `dir` for `(suid, colName, colType)`.
    /// Creates `dir` if it doesn't exist.
    pub fn open(dir: impl Into<PathBuf>, suid: i64, col_name: impl Into<String>, col_type: ColType) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self {
            dir,
            suid,
            col_name: col_name.into(),
            col_type,
        })
    }

    /// Write `version` from `batch`, a sequence of `(term, postings)`
    /// already sorted ascending by term. If `dedup` is set, adjacent
    /// records sharing the same term are merged by concatenating their
    /// postings, then sorting and deduplicating the result — the same
    /// defense `indexMergeSameKey` applies at the facade layer, offered
    /// here too since a writer may be fed directly in tests or by
    /// `rebuild`. Returns the path the segment was written to.
    pub fn put(
        &self,
        version: u32,
        batch: impl IntoIterator<Item = (Vec<u8>, Vec<u64>)>,
        dedup: bool,
    ) -> Result<PathBuf> {
        let merged = if dedup {
            coalesce_adjacent(batch)
        } else {
            batch.into_iter().collect()
        };
        let bytes = build_segment_bytes(self.suid, &self.col_name, self.col_type, merged);
        let path = self.dir.join(segment_filename(self.suid, &self.col_name, version));
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// No-op; provided for symmetry with the reader's `close` and the
    /// spec's `open(...) → Writer, put(...), close` operation list.
    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

fn coalesce_adjacent(batch: impl IntoIterator<Item = (Vec<u8>, Vec<u64>)>) -> Vec<(Vec<u8>, Vec<u64>)> {
    let mut out: Vec<(Vec<u8>, Vec<u64>)> = Vec::new();
    for (term, postings) in batch {
        match out.last_mut() {
            Some((last_term, last_postings)) if *last_term == term => {
                last_postings.extend_from_slice(&postings);
            }
            _ => out.push((term, postings)),
        }
    }
    for (_, postings) in &mut out {
        postings.sort_unstable();
        postings.dedup();
    }
    out
}

fn build_segment_bytes(
    suid: i64,
    col_name: &str,
    col_type: ColType,
    term_postings: Vec<(Vec<u8>, Vec<u64>)>,
) -> Vec<u8> {
    let header = Header {
        suid,
        col_name: col_name.to_string(),
        col_type,
        num_terms: term_postings.len() as u32,
    };

    let mut postings_area = Vec::new();
    let mut term_index = Vec::new();

    for (term, postings) in &term_postings {
        let posting_offset = postings_area.len() as u64;
        postings_area.extend_from_slice(&(postings.len() as u32).to_le_bytes());
        for uid in postings {
            postings_area.extend_from_slice(&uid.to_le_bytes());
        }
        let posting_len = postings_area.len() as u32 - (posting_offset as u32 + 4);

        term_index.extend_from_slice(&(term.len() as u16).to_le_bytes());
        term_index.extend_from_slice(term);
        term_index.extend_from_slice(&posting_offset.to_le_bytes());
        term_index.extend_from_slice(&posting_len.to_le_bytes());
    }

    let header_len = header.encoded_len();
    let term_index_offset = (header_len + postings_area.len()) as u64;

    let mut buf = Vec::with_capacity(header_len + postings_area.len() + term_index.len() + FOOTER_SIZE);
    header.encode_into(&mut buf);
    buf.extend_from_slice(&postings_area);
    buf.extend_from_slice(&term_index);

    let crc = checksum(&buf);
    buf.extend_from_slice(&encode_footer(term_index_offset, crc));
    buf
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tfile.tmp");
    {
        let mut file = fs::File::create(&tmp_path).map_err(|e| Error::io(&tmp_path, e))?;
        use std::io::Write;
        file.write_all(bytes).map_err(|e| Error::io(&tmp_path, e))?;
        file.sync_all().map_err(|e| Error::io(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}
