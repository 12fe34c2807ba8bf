//! Binary layout constants and header/footer encode-decode helpers for the
//! `.tfile` segment format (§4.5):
//!
//! ```text
//! [Header:   magic(4) | version(4) | suid(8) | colType(1) | colNameLen(2) | colName | numTerms(4) ]
//! [Postings: for each term, term-sorted: postingLen(4) | uid0..uidN (8 each, ascending) ]
//! [TermIdx:  for each term: termLen(2) | termBytes | postingOffset(8) | postingLen(4) ]
//! [Footer:   termIndexOffset(8) | crc32(4) ]
//! ```
//!
//! Unlike the mmap'd segment format this was grounded on, the header here
//! is variable-length (it carries `colName` inline) and postings are plain
//! ascending `u64` arrays rather than delta-varint-encoded — both follow
//! the layout given directly in the file format this crate implements
//! rather than the grounding source's own on-disk shape.

use fluxstore_core::{ColType, Error, Result};

/// Magic bytes identifying a `.tfile` segment.
pub const MAGIC: &[u8; 4] = b"TFLX";
/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;
/// Footer size: `termIndexOffset(8) | crc32(4)`.
pub const FOOTER_SIZE: usize = 12;

/// Decoded header fields (§4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Table-group this segment belongs to.
    pub suid: i64,
    /// Column this segment indexes.
    pub col_name: String,
    /// Column value type tag.
    pub col_type: ColType,
    /// Number of distinct terms in the term index.
    pub num_terms: u32,
}

impl Header {
    /// Encoded byte length of this header (varies with `col_name`'s length).
    pub fn encoded_len(&self) -> usize {
        4 + 4 + 8 + 1 + 2 + self.col_name.len() + 4
    }

    /// Append this header's encoding to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&self.suid.to_le_bytes());
        out.push(self.col_type as u8);
        out.extend_from_slice(&(self.col_name.len() as u16).to_le_bytes());
        out.extend_from_slice(self.col_name.as_bytes());
        out.extend_from_slice(&self.num_terms.to_le_bytes());
    }

    /// Parse a header from the start of `bytes`, returning it and the
    /// number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < 13 {
            return Err(Error::Corruption("tfile header truncated before colNameLen".into()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(Error::Corruption("bad tfile magic".into()));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(Error::Corruption(format!("unsupported tfile version {version}")));
        }
        let suid = i64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let col_type = ColType::from_u8(bytes[16])
            .ok_or_else(|| Error::Corruption(format!("unknown colType tag {}", bytes[16])))?;
        let col_name_len = u16::from_le_bytes(bytes[17..19].try_into().unwrap()) as usize;
        let name_end = 19 + col_name_len;
        if bytes.len() < name_end + 4 {
            return Err(Error::Corruption("tfile header truncated before numTerms".into()));
        }
        let col_name = std::str::from_utf8(&bytes[19..name_end])
            .map_err(|_| Error::Corruption("tfile colName is not valid utf-8".into()))?
            .to_string();
        let num_terms = u32::from_le_bytes(bytes[name_end..name_end + 4].try_into().unwrap());
        let header = Header {
            suid,
            col_name,
            col_type,
            num_terms,
        };
        let consumed = name_end + 4;
        Ok((header, consumed))
    }
}

/// Compute the CRC32 over `bytes[..term_index_end]` (everything but the
/// footer itself).
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// Encode the footer.
pub fn encode_footer(term_index_offset: u64, crc: u32) -> [u8; FOOTER_SIZE] {
    let mut out = [0u8; FOOTER_SIZE];
    out[0..8].copy_from_slice(&term_index_offset.to_le_bytes());
    out[8..12].copy_from_slice(&crc.to_le_bytes());
    out
}

/// Decode the footer from the last [`FOOTER_SIZE`] bytes of a segment.
pub fn decode_footer(tail: &[u8; FOOTER_SIZE]) -> (u64, u32) {
    let term_index_offset = u64::from_le_bytes(tail[0..8].try_into().unwrap());
    let crc = u32::from_le_bytes(tail[8..12].try_into().unwrap());
    (term_index_offset, crc)
}

/// Build the filename a segment is written under, encoding `suid`,
/// `colName`, and `version` per §6 ("Filenames encode suid, colName,
/// version").
pub fn segment_filename(suid: i64, col_name: &str, version: u32) -> String {
    format!("{suid}_{col_name}_{version:010}.tfile")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrips() {
        let header = Header {
            suid: -7,
            col_name: "device_id".to_string(),
            col_type: ColType::Binary,
            num_terms: 42,
        };
        let mut buf = Vec::new();
        header.encode_into(&mut buf);
        assert_eq!(buf.len(), header.encoded_len());
        let (decoded, consumed) = Header::decode(&buf).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut buf = vec![0u8; 32];
        buf[0..4].copy_from_slice(b"NOPE");
        assert!(Header::decode(&buf).is_err());
    }

    #[test]
    fn footer_roundtrips() {
        let footer = encode_footer(1234, 0xDEADBEEF);
        assert_eq!(decode_footer(&footer), (1234, 0xDEADBEEF));
    }

    #[test]
    fn filename_encodes_suid_col_and_version() {
        let name = segment_filename(10, "k", 3);
        assert!(name.contains("10"));
        assert!(name.contains('k'));
        assert!(name.contains("0000000003"));
    }
}
