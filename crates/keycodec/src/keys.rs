//! Concrete composite key types for the stream state store (§3.1).
//!
//! Every key here implements `encode`/`decode`, and the module exposes a
//! `*_cmp` function per keyspace. The testable invariant (§8) is that
//! `semantic_cmp(a, b) == encode(a).cmp(&encode(b))` for every key type —
//! see the `tests` module, which checks this against the `*_cmp` functions
//! directly rather than duplicating a second comparator.

use crate::sortable::{decode_i32, decode_i64, decode_u64, encode_i32, encode_i64, encode_u64};
use std::cmp::Ordering;

/// Time-window key: `(ts, groupId)`. Used directly by the fill keyspace,
/// and nested inside [`StateKey`] for the interval-window keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WinKey {
    /// Window timestamp.
    pub ts: i64,
    /// Group identifier the window belongs to.
    pub group_id: u64,
}

impl WinKey {
    /// Construct a new window key.
    pub fn new(ts: i64, group_id: u64) -> Self {
        Self { ts, group_id }
    }

    /// Encode as `ts(8) || group_id(8)`, order-preserving.
    pub fn encode(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0..8].copy_from_slice(&encode_i64(self.ts));
        out[8..16].copy_from_slice(&encode_u64(self.group_id));
        out
    }

    /// Decode the inverse of [`WinKey::encode`].
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != 16 {
            return None;
        }
        let ts = decode_i64(buf[0..8].try_into().ok()?);
        let group_id = decode_u64(buf[8..16].try_into().ok()?);
        Some(Self { ts, group_id })
    }
}

/// Compare two [`WinKey`]s by `(ts, groupId)`.
pub fn win_key_cmp(a: &WinKey, b: &WinKey) -> Ordering {
    a.ts.cmp(&b.ts).then(a.group_id.cmp(&b.group_id))
}

/// State key: `(opNum, ts, groupId)`. Key for the interval-window keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey {
    /// Operator this state entry belongs to.
    pub op_num: i32,
    /// Window sub-key.
    pub win: WinKey,
}

impl StateKey {
    /// Construct a new state key.
    pub fn new(op_num: i32, ts: i64, group_id: u64) -> Self {
        Self {
            op_num,
            win: WinKey::new(ts, group_id),
        }
    }

    /// Encode as `op_num(4) || ts(8) || group_id(8)`.
    pub fn encode(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        out[0..4].copy_from_slice(&encode_i32(self.op_num));
        out[4..20].copy_from_slice(&self.win.encode());
        out
    }

    /// Decode the inverse of [`StateKey::encode`].
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != 20 {
            return None;
        }
        let op_num = decode_i32(buf[0..4].try_into().ok()?);
        let win = WinKey::decode(&buf[4..20])?;
        Some(Self { op_num, win })
    }
}

/// Compare two [`StateKey`]s by `(opNum, ts, groupId)`.
pub fn state_key_cmp(a: &StateKey, b: &StateKey) -> Ordering {
    a.op_num
        .cmp(&b.op_num)
        .then_with(|| win_key_cmp(&a.win, &b.win))
}

/// Half-open session interval `[skey, ekey]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionRange {
    /// Start of the session interval.
    pub skey: i64,
    /// End of the session interval.
    pub ekey: i64,
}

impl SessionRange {
    /// Construct a new session range.
    pub fn new(skey: i64, ekey: i64) -> Self {
        Self { skey, ekey }
    }

    /// Whether this range overlaps `other` (inclusive on both ends, as
    /// TDengine's `sessionRangeKeyCmpr` treats the interval).
    pub fn overlaps(&self, other: &SessionRange) -> bool {
        self.skey <= other.ekey && self.ekey >= other.skey
    }

    /// Expand this range by `gap` on both sides.
    pub fn widen(&self, gap: i64) -> SessionRange {
        SessionRange::new(self.skey.saturating_sub(gap), self.ekey.saturating_add(gap))
    }

    /// The union of two overlapping ranges.
    pub fn merge(&self, other: &SessionRange) -> SessionRange {
        SessionRange::new(self.skey.min(other.skey), self.ekey.max(other.ekey))
    }
}

/// Session key: `(groupId, [skey, ekey])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Group identifier the session belongs to.
    pub group_id: u64,
    /// The session's interval.
    pub win: SessionRange,
}

impl SessionKey {
    /// Construct a new session key.
    pub fn new(group_id: u64, skey: i64, ekey: i64) -> Self {
        Self {
            group_id,
            win: SessionRange::new(skey, ekey),
        }
    }

    /// Encode as `group_id(8) || skey(8) || ekey(8)`, in total-order form.
    pub fn encode(&self) -> [u8; 24] {
        let mut out = [0u8; 24];
        out[0..8].copy_from_slice(&encode_u64(self.group_id));
        out[8..16].copy_from_slice(&encode_i64(self.win.skey));
        out[16..24].copy_from_slice(&encode_i64(self.win.ekey));
        out
    }

    /// Decode the inverse of [`SessionKey::encode`].
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != 24 {
            return None;
        }
        let group_id = decode_u64(buf[0..8].try_into().ok()?);
        let skey = decode_i64(buf[8..16].try_into().ok()?);
        let ekey = decode_i64(buf[16..24].try_into().ok()?);
        Some(Self {
            group_id,
            win: SessionRange::new(skey, ekey),
        })
    }
}

/// Total order over [`SessionKey`]: `(groupId, skey, ekey)`.
///
/// This is the order used for on-disk storage and cursor walks; it must
/// match the byte order of [`SessionKey::encode`].
pub fn session_key_order_cmp(a: &SessionKey, b: &SessionKey) -> Ordering {
    a.group_id
        .cmp(&b.group_id)
        .then(a.win.skey.cmp(&b.win.skey))
        .then(a.win.ekey.cmp(&b.win.ekey))
}

/// Tri-valued range comparator: two sessions "match" (return `Equal`) when
/// their groups are equal and their intervals overlap. Otherwise ordered
/// by `groupId`, then by whichever interval lies strictly before the
/// other. Used only by session-probe operations, never for storage order.
///
/// Mirrors TDengine's `sessionRangeKeyCmpr`.
pub fn session_key_range_cmp(a: &SessionKey, b: &SessionKey) -> Ordering {
    match a.group_id.cmp(&b.group_id) {
        Ordering::Equal => {}
        other => return other,
    }
    if a.win.skey > b.win.ekey {
        Ordering::Greater
    } else if a.win.ekey < b.win.skey {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// State-session key: `(opNum, SessionKey)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateSessionKey {
    /// Operator this session entry belongs to.
    pub op_num: i32,
    /// Session sub-key.
    pub session: SessionKey,
}

impl StateSessionKey {
    /// Construct a new state-session key.
    pub fn new(op_num: i32, session: SessionKey) -> Self {
        Self { op_num, session }
    }

    /// Encode as `op_num(4) || session(24)`.
    pub fn encode(&self) -> [u8; 28] {
        let mut out = [0u8; 28];
        out[0..4].copy_from_slice(&encode_i32(self.op_num));
        out[4..28].copy_from_slice(&self.session.encode());
        out
    }

    /// Decode the inverse of [`StateSessionKey::encode`].
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != 28 {
            return None;
        }
        let op_num = decode_i32(buf[0..4].try_into().ok()?);
        let session = SessionKey::decode(&buf[4..28])?;
        Some(Self { op_num, session })
    }
}

/// Compare two [`StateSessionKey`]s: first by `opNum`, then by the
/// session's total order (never the range comparator).
pub fn state_session_key_cmp(a: &StateSessionKey, b: &StateSessionKey) -> Ordering {
    a.op_num
        .cmp(&b.op_num)
        .then_with(|| session_key_order_cmp(&a.session, &b.session))
}

/// Application-defined fixed-size descriptor used by state-function
/// operators. Ordered lexicographically by its raw bytes; Fluxstore does
/// not interpret the contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TupleKey(pub Vec<u8>);

impl TupleKey {
    /// Wrap raw descriptor bytes as a tuple key.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the encoded bytes (encoding is the identity: bytes are
    /// already in their final sortable form).
    pub fn encode(&self) -> &[u8] {
        &self.0
    }

    /// Decode from raw bytes (identity, provided for symmetry with the
    /// other key types).
    pub fn decode(buf: &[u8]) -> Self {
        Self(buf.to_vec())
    }
}

/// Compare two [`TupleKey`]s lexicographically by byte content.
pub fn tuple_key_cmp(a: &TupleKey, b: &TupleKey) -> Ordering {
    a.0.cmp(&b.0)
}

/// Par-name / par-tag key: keyed by `groupId` (an `i64`, per §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParKey(pub i64);

impl ParKey {
    /// Encode as a single order-preserving `i64`.
    pub fn encode(&self) -> [u8; 8] {
        encode_i64(self.0)
    }

    /// Decode the inverse of [`ParKey::encode`].
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != 8 {
            return None;
        }
        Some(ParKey(decode_i64(buf.try_into().ok()?)))
    }
}

/// Compare two [`ParKey`]s by group id.
pub fn par_key_cmp(a: &ParKey, b: &ParKey) -> Ordering {
    a.0.cmp(&b.0)
}

/// Build a composite extension-key used by `stateAddIfNotExist`'s equality
/// probe, by escaping and concatenating each field (§4.1's
/// variable-length-before-fixed-suffix rule; see [`crate::varbytes`]).
pub fn encode_composite_extension(fields: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for field in fields {
        crate::varbytes::encode_var_bytes(field, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_win() -> impl Strategy<Value = WinKey> {
        (any::<i64>(), any::<u64>()).prop_map(|(ts, g)| WinKey::new(ts, g))
    }

    fn arb_state() -> impl Strategy<Value = StateKey> {
        (any::<i32>(), any::<i64>(), any::<u64>())
            .prop_map(|(op, ts, g)| StateKey::new(op, ts, g))
    }

    fn arb_session() -> impl Strategy<Value = SessionKey> {
        (any::<u64>(), any::<i64>(), any::<i64>())
            .prop_map(|(g, s, e)| SessionKey::new(g, s, e))
    }

    proptest! {
        #[test]
        fn win_key_roundtrips(k in arb_win()) {
            prop_assert_eq!(WinKey::decode(&k.encode()), Some(k));
        }

        #[test]
        fn win_key_byte_order_matches_semantic(a in arb_win(), b in arb_win()) {
            prop_assert_eq!(a.encode().as_slice().cmp(b.encode().as_slice()), win_key_cmp(&a, &b));
        }

        #[test]
        fn state_key_roundtrips(k in arb_state()) {
            prop_assert_eq!(StateKey::decode(&k.encode()), Some(k));
        }

        #[test]
        fn state_key_byte_order_matches_semantic(a in arb_state(), b in arb_state()) {
            prop_assert_eq!(a.encode().as_slice().cmp(b.encode().as_slice()), state_key_cmp(&a, &b));
        }

        #[test]
        fn session_key_roundtrips(k in arb_session()) {
            prop_assert_eq!(SessionKey::decode(&k.encode()), Some(k));
        }

        #[test]
        fn session_key_byte_order_matches_total_order(a in arb_session(), b in arb_session()) {
            prop_assert_eq!(
                a.encode().as_slice().cmp(b.encode().as_slice()),
                session_key_order_cmp(&a, &b)
            );
        }

        #[test]
        fn state_session_key_roundtrips(op in any::<i32>(), s in arb_session()) {
            let k = StateSessionKey::new(op, s);
            prop_assert_eq!(StateSessionKey::decode(&k.encode()), Some(k));
        }

        #[test]
        fn state_session_key_byte_order_matches_semantic(
            op_a in any::<i32>(), a in arb_session(),
            op_b in any::<i32>(), b in arb_session(),
        ) {
            let ka = StateSessionKey::new(op_a, a);
            let kb = StateSessionKey::new(op_b, b);
            prop_assert_eq!(
                ka.encode().as_slice().cmp(kb.encode().as_slice()),
                state_session_key_cmp(&ka, &kb)
            );
        }
    }

    #[test]
    fn session_range_cmp_is_zero_on_overlap() {
        let a = SessionKey::new(1, 100, 200);
        let b = SessionKey::new(1, 150, 160);
        assert_eq!(session_key_range_cmp(&a, &b), Ordering::Equal);
    }

    #[test]
    fn session_range_cmp_orders_disjoint_ranges() {
        let earlier = SessionKey::new(1, 0, 10);
        let later = SessionKey::new(1, 20, 30);
        assert_eq!(session_key_range_cmp(&earlier, &later), Ordering::Less);
        assert_eq!(session_key_range_cmp(&later, &earlier), Ordering::Greater);
    }

    #[test]
    fn session_range_cmp_orders_by_group_first() {
        let a = SessionKey::new(1, 1000, 2000);
        let b = SessionKey::new(2, 0, 10);
        assert_eq!(session_key_range_cmp(&a, &b), Ordering::Less);
    }

    #[test]
    fn widen_and_overlap_agree_with_gap_semantics() {
        let prior = SessionRange::new(100, 200);
        let probe = SessionRange::new(205, 210);
        assert!(!prior.overlaps(&probe));
        assert!(prior.widen(10).overlaps(&probe));
    }

    #[test]
    fn tuple_key_is_lexicographic() {
        let a = TupleKey::new(vec![1, 2, 3]);
        let b = TupleKey::new(vec![1, 2, 4]);
        assert_eq!(tuple_key_cmp(&a, &b), Ordering::Less);
    }

    #[test]
    fn par_key_roundtrips() {
        let k = ParKey(-42);
        assert_eq!(ParKey::decode(&k.encode()), Some(k));
    }

    #[test]
    fn composite_extension_distinguishes_field_boundaries() {
        // Without escaping, ("ab","c") and ("a","bc") would collide.
        let a = encode_composite_extension(&[b"ab", b"c"]);
        let b = encode_composite_extension(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }
}
