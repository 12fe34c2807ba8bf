//! Composite key encoding for Fluxstore's ordered keyspaces.
//!
//! All composite keys serialize to a byte string whose lexicographic order
//! matches their semantic order, so that a plain `BTreeMap<Vec<u8>, _>` (or
//! any other byte-ordered backend) can serve as the storage for every
//! keyspace without a custom comparator. See [`sortable`] for the integer
//! encoding and [`varbytes`] for the escaped variable-length encoding; see
//! [`keys`] for the concrete key types used by the stream state store.

#![warn(missing_docs)]

pub mod keys;
pub mod sortable;
pub mod varbytes;

pub use keys::{
    encode_composite_extension, par_key_cmp, session_key_order_cmp, session_key_range_cmp,
    state_key_cmp, state_session_key_cmp, tuple_key_cmp, win_key_cmp, ParKey, SessionKey,
    SessionRange, StateKey, StateSessionKey, TupleKey, WinKey,
};
