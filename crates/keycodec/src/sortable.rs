//! Order-preserving fixed-width integer encoding.
//!
//! Unsigned integers are encoded big-endian, which already makes byte order
//! match numeric order. Signed integers are additionally biased by flipping
//! the sign bit, so that the most negative value encodes to all-zero bytes
//! and the most positive value encodes to all-one bytes — negative values
//! then sort before positive ones under plain byte comparison.

use byteorder::{BigEndian, ByteOrder};

/// Encode an `i64` such that byte order matches numeric order.
pub fn encode_i64(v: i64) -> [u8; 8] {
    let biased = (v as u64) ^ (1u64 << 63);
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, biased);
    buf
}

/// Inverse of [`encode_i64`].
pub fn decode_i64(buf: &[u8; 8]) -> i64 {
    let biased = BigEndian::read_u64(buf);
    (biased ^ (1u64 << 63)) as i64
}

/// Encode an `i32` such that byte order matches numeric order.
pub fn encode_i32(v: i32) -> [u8; 4] {
    let biased = (v as u32) ^ (1u32 << 31);
    let mut buf = [0u8; 4];
    BigEndian::write_u32(&mut buf, biased);
    buf
}

/// Inverse of [`encode_i32`].
pub fn decode_i32(buf: &[u8; 4]) -> i32 {
    let biased = BigEndian::read_u32(buf);
    (biased ^ (1u32 << 31)) as i32
}

/// Encode a `u64`: plain big-endian, already order-preserving.
pub fn encode_u64(v: u64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, v);
    buf
}

/// Inverse of [`encode_u64`].
pub fn decode_u64(buf: &[u8; 8]) -> u64 {
    BigEndian::read_u64(buf)
}
