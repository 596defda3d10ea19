use crate::format::{PREFIX_HEX_LEN, RECORD_SIZE, Record, SUFFIX_HEX_LEN};

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Convert hex ASCII character to nibble value (0-15)
#[inline]
pub fn hex_to_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// Parse exactly 6 hex characters into a 24-bit prefix.
///
/// Unlike `u32::from_str_radix` this rejects a leading `+`, so only the
/// 16^6 well-formed spellings are accepted.
#[inline]
pub fn parse_prefix(hex: &[u8]) -> Option<u32> {
    if hex.len() != PREFIX_HEX_LEN {
        return None;
    }
    hex.iter()
        .try_fold(0u32, |acc, &c| Some((acc << 4) | hex_to_nibble(c)? as u32))
}

/// Decode the 34 hex characters following the prefix into a suffix record.
#[inline]
pub fn decode_suffix(hex: &[u8], out: &mut Record) -> Option<()> {
    if hex.len() != SUFFIX_HEX_LEN {
        return None;
    }
    for (byte, pair) in out.iter_mut().zip(hex.chunks_exact(2)) {
        *byte = (hex_to_nibble(pair[0])? << 4) | hex_to_nibble(pair[1])?;
    }
    Some(())
}

/// Encode a suffix record as 34 lower-case hex characters.
pub fn encode_suffix(record: &Record) -> String {
    let mut out = String::with_capacity(RECORD_SIZE * 2);
    for b in record {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0xF) as usize] as char);
    }
    out
}

/// Convert prefix u32 to 6-char lower-case hex string (stack allocated)
#[inline]
pub fn prefix_to_hex(prefix: u32) -> [u8; PREFIX_HEX_LEN] {
    [
        HEX[((prefix >> 20) & 0xF) as usize],
        HEX[((prefix >> 16) & 0xF) as usize],
        HEX[((prefix >> 12) & 0xF) as usize],
        HEX[((prefix >> 8) & 0xF) as usize],
        HEX[((prefix >> 4) & 0xF) as usize],
        HEX[(prefix & 0xF) as usize],
    ]
}
