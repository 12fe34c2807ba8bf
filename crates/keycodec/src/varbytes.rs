//! Escaped, zero-terminated encoding for variable-length fields.
//!
//! Used whenever a composite key packs a variable-length field ahead of a
//! fixed-length suffix (§4.1): the field is terminated by `0x00 0x00`, and
//! any `0x00` byte occurring inside the field is escaped as `0x00 0x01` so
//! the terminator remains unambiguous. This also keeps byte order correct:
//! a string that is a strict prefix of another encodes to a strictly
//! smaller byte sequence, because its terminator (`0x00 0x00`) is less than
//! any continuation byte the longer string emits at that position.

/// Encode `data` with escaping and a terminator, appending to `out`.
pub fn encode_var_bytes(data: &[u8], out: &mut Vec<u8>) {
    for &b in data {
        if b == 0x00 {
            out.push(0x00);
            out.push(0x01);
        } else {
            out.push(b);
        }
    }
    out.push(0x00);
    out.push(0x00);
}

/// Decode one escaped, zero-terminated field starting at `input[0]`.
///
/// Returns the decoded bytes and the number of input bytes consumed
/// (including the two-byte terminator), or `None` if `input` does not
/// contain a valid terminator.
pub fn decode_var_bytes(input: &[u8]) -> Option<(Vec<u8>, usize)> {
    let mut decoded = Vec::new();
    let mut i = 0;
    while i < input.len() {
        if input[i] == 0x00 {
            let marker = *input.get(i + 1)?;
            match marker {
                0x00 => return Some((decoded, i + 2)),
                0x01 => {
                    decoded.push(0x00);
                    i += 2;
                }
                _ => return None,
            }
        } else {
            decoded.push(input[i]);
            i += 1;
        }
    }
    None
}
