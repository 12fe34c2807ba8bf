//! Index domain types shared by the cache, TFile, and index facade crates
//! (§3.2): the term a write or query is framed in, and the boolean query
//! shapes (`Eq`/`Prefix`/`Range`) that both the in-memory cache and the
//! on-disk TFile evaluate against `colVal` bytes.

use std::ops::Bound;

/// How a term's posting write should be interpreted when collapsing
/// records for the same `uid` (§3.2, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperType {
    /// Add `uid` to the term's posting set.
    Add,
    /// Remove `uid` from the term's posting set (tombstone).
    Del,
    /// Replace `uid`'s prior record; same collapsing behavior as `Add`.
    Update,
}

/// Column value type tag, stored as a single byte in the TFile header
/// (§4.5). Fluxstore does not interpret `colVal` bytes itself — callers
/// are expected to pre-encode typed values into sortable byte form (e.g.
/// via [`fluxstore_keycodec::sortable`](../fluxstore_keycodec/sortable))
/// before they reach a term, so that `Range`/`Prefix` queries can stay
/// plain bytewise comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColType {
    /// Opaque binary / string column value.
    Binary = 0,
    /// Sortable-encoded signed integer.
    Int = 1,
    /// Sortable-encoded unsigned integer.
    UInt = 2,
}

impl ColType {
    /// Decode the single-byte on-disk tag.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ColType::Binary),
            1 => Some(ColType::Int),
            2 => Some(ColType::UInt),
            _ => None,
        }
    }
}

/// One indexed fact: `uid` should be added to, removed from, or updated in
/// the posting set of `(colName, colVal)` (§3.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Column this term belongs to; selects the cache/TFile pair.
    pub col_name: String,
    /// Type tag for `col_val`.
    pub col_type: ColType,
    /// The (pre-encoded, sortable) column value.
    pub col_val: Vec<u8>,
    /// Add, remove, or update.
    pub op_type: OperType,
    /// Table-group identifier this term's segment belongs to.
    pub suid: i64,
    /// Document id being added/removed/updated.
    pub uid: u64,
}

/// A query over one column's `colVal` space (§4.5, §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Exact `colVal` match.
    Eq(Vec<u8>),
    /// `colVal` starts with this byte prefix.
    Prefix(Vec<u8>),
    /// `colVal` within `[lower, upper]` (bounds may be unbounded/exclusive).
    Range {
        /// Lower bound.
        lower: Bound<Vec<u8>>,
        /// Upper bound.
        upper: Bound<Vec<u8>>,
    },
}

impl Query {
    /// Whether `val` satisfies this query.
    pub fn matches(&self, val: &[u8]) -> bool {
        match self {
            Query::Eq(expected) => expected.as_slice() == val,
            Query::Prefix(prefix) => val.starts_with(prefix.as_slice()),
            Query::Range { lower, upper } => {
                let above_lower = match lower {
                    Bound::Unbounded => true,
                    Bound::Included(b) => val >= b.as_slice(),
                    Bound::Excluded(b) => val > b.as_slice(),
                };
                let below_upper = match upper {
                    Bound::Unbounded => true,
                    Bound::Included(b) => val <= b.as_slice(),
                    Bound::Excluded(b) => val < b.as_slice(),
                };
                above_lower && below_upper
            }
        }
    }
}

/// Result of collapsing a sequence of `(uid, operType)` records for a
/// single `colVal` down to the newest `operType` per `uid` (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// The collapsed posting set is a normal, positive result.
    Normal,
    /// The collapsed result's last operation was `Del`; the facade should
    /// skip consulting the TFile for this term.
    Deletion,
}

/// Boolean operator combining multiple per-term posting lists (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// Sorted intersection of all lists.
    Must,
    /// Sorted union of all lists.
    Should,
    /// Subtraction from the first list.
    Not,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_query_matches_only_exact_value() {
        let q = Query::Eq(b"abc".to_vec());
        assert!(q.matches(b"abc"));
        assert!(!q.matches(b"abcd"));
    }

    #[test]
    fn prefix_query_matches_any_extension() {
        let q = Query::Prefix(b"ab".to_vec());
        assert!(q.matches(b"ab"));
        assert!(q.matches(b"abcdef"));
        assert!(!q.matches(b"a"));
    }

    #[test]
    fn range_query_respects_inclusive_and_exclusive_bounds() {
        let q = Query::Range {
            lower: Bound::Included(b"b".to_vec()),
            upper: Bound::Excluded(b"d".to_vec()),
        };
        assert!(!q.matches(b"a"));
        assert!(q.matches(b"b"));
        assert!(q.matches(b"c"));
        assert!(!q.matches(b"d"));
    }

    #[test]
    fn col_type_roundtrips_through_its_byte_tag() {
        for ct in [ColType::Binary, ColType::Int, ColType::UInt] {
            assert_eq!(ColType::from_u8(ct as u8), Some(ct));
        }
    }
}
