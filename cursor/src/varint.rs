//! Primitive codecs: base-128 varints, zig-zag and little-endian fixed widths.
//!
//! Every `put_*` function takes the output buffer, the cursor that bounds the
//! write, and a `count_only` flag. In count-only mode the cursor advances and
//! capacity is validated exactly as for a real write, but no byte is stored,
//! so callers may pass an empty buffer.
//!
//! Writes are all-or-nothing: capacity is checked before the first byte is
//! stored, so a failed call leaves both the cursor and the buffer untouched.

use crate::cursor::ByteCursor;
use crate::error::{CursorError, CursorResult};

/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Returns the number of bytes `value` occupies as a varint.
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Zig-zag maps a signed 32-bit value so small magnitudes encode short.
#[must_use]
pub const fn zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Zig-zag maps a signed 64-bit value so small magnitudes encode short.
#[must_use]
pub const fn zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Writes `bytes` verbatim.
pub fn put_slice(
    out: &mut [u8],
    cursor: &mut ByteCursor,
    bytes: &[u8],
    count_only: bool,
) -> CursorResult<()> {
    cursor.ensure(bytes.len())?;
    if !count_only {
        let start = cursor.position();
        let available = out.len();
        let dst = out
            .get_mut(start..start + bytes.len())
            .ok_or(CursorError::BufferTooSmall {
                needed: start + bytes.len(),
                available,
            })?;
        dst.copy_from_slice(bytes);
    }
    cursor.advance(bytes.len())?;
    Ok(())
}

/// Writes `value` as a varint: 7-bit groups, low-order group first, with the
/// continuation bit set on every group but the last.
///
/// Returns the number of bytes written.
pub fn put_varint(
    out: &mut [u8],
    cursor: &mut ByteCursor,
    value: u64,
    count_only: bool,
) -> CursorResult<usize> {
    let mut scratch = [0u8; MAX_VARINT_LEN];
    let len = encode_varint(value, &mut scratch);
    put_slice(out, cursor, &scratch[..len], count_only)?;
    Ok(len)
}

/// Writes a little-endian 32-bit value.
pub fn put_fixed32(
    out: &mut [u8],
    cursor: &mut ByteCursor,
    value: u32,
    count_only: bool,
) -> CursorResult<()> {
    put_slice(out, cursor, &value.to_le_bytes(), count_only)
}

/// Writes a little-endian 64-bit value.
pub fn put_fixed64(
    out: &mut [u8],
    cursor: &mut ByteCursor,
    value: u64,
    count_only: bool,
) -> CursorResult<()> {
    put_slice(out, cursor, &value.to_le_bytes(), count_only)
}

/// Encodes `value` as a varint into `scratch`, returning the length used.
pub fn encode_varint(mut value: u64, scratch: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut len = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        scratch[len] = byte;
        len += 1;
        if value == 0 {
            return len;
        }
    }
}

/// Decodes one varint from the front of `bytes`.
///
/// Returns `(value, bytes_consumed)`. Groups past the 64th bit are consumed
/// but their bits are dropped, so an over-long encoding still terminates at
/// its final group.
pub fn decode_varint(bytes: &[u8]) -> CursorResult<(u64, usize)> {
    if bytes.is_empty() {
        return Err(CursorError::EmptyInput);
    }

    let mut value = 0u64;
    for (idx, &byte) in bytes.iter().enumerate() {
        let shift = idx * 7;
        if shift < 64 {
            value |= u64::from(byte & 0x7F) << shift;
        }
        if byte & 0x80 == 0 {
            return Ok((value, idx + 1));
        }
    }
    Err(CursorError::BufferTooSmall {
        needed: bytes.len() + 1,
        available: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u64) -> Vec<u8> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let mut cursor = ByteCursor::with_len(buf.len());
        let len = put_varint(&mut buf, &mut cursor, value, false).unwrap();
        buf[..len].to_vec()
    }

    #[test]
    fn varint_300() {
        assert_eq!(encode(300), vec![0xAC, 0x02]);
    }

    #[test]
    fn varint_zero_is_one_byte() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(varint_len(0), 1);
    }

    #[test]
    fn varint_boundary_lengths() {
        let cases = [
            (127u64, 1usize),
            (128, 2),
            (16_383, 2),
            (16_384, 3),
            (u64::from(u32::MAX), 5),
            ((1u64 << 63) - 1, 9),
            (u64::MAX, 10),
        ];
        for (value, len) in cases {
            assert_eq!(varint_len(value), len, "varint_len({value})");
            assert_eq!(encode(value).len(), len, "encoded length of {value}");
        }
    }

    #[test]
    fn decode_reads_until_terminator() {
        let (value, used) = decode_varint(&[0xAC, 0x02, 0xFF]).unwrap();
        assert_eq!(value, 300);
        assert_eq!(used, 2);
    }

    #[test]
    fn decode_empty_input() {
        assert_eq!(decode_varint(&[]), Err(CursorError::EmptyInput));
    }

    #[test]
    fn decode_missing_terminator() {
        let err = decode_varint(&[0x80, 0x80]).unwrap_err();
        assert!(matches!(err, CursorError::BufferTooSmall { available: 2, .. }));
    }

    #[test]
    fn decode_ignores_bits_past_64() {
        // Eleven groups: ten 0xFF continuation bytes then a terminator.
        let mut bytes = vec![0xFF; 10];
        bytes.push(0x01);
        let (value, used) = decode_varint(&bytes).unwrap();
        assert_eq!(used, 11);
        assert_eq!(value, u64::MAX);
    }

    #[test]
    fn zigzag_mapping() {
        assert_eq!(zigzag32(0), 0);
        assert_eq!(zigzag32(-1), 1);
        assert_eq!(zigzag32(1), 2);
        assert_eq!(zigzag32(-2), 3);
        assert_eq!(zigzag32(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag32(i32::MIN), u32::MAX);
        assert_eq!(zigzag64(-1), 1);
        assert_eq!(zigzag64(i64::MIN), u64::MAX);
    }

    #[test]
    fn fixed_widths_are_little_endian() {
        let mut buf = [0u8; 12];
        let mut cursor = ByteCursor::with_len(buf.len());
        put_fixed32(&mut buf, &mut cursor, 0x1234_5678, false).unwrap();
        put_fixed64(&mut buf, &mut cursor, 0x0102_0304_0506_0708, false).unwrap();
        assert_eq!(buf[..4], [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(buf[4..], [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn fixed32_needs_four_bytes() {
        let mut buf = [0u8; 3];
        let mut cursor = ByteCursor::with_len(buf.len());
        let err = put_fixed32(&mut buf, &mut cursor, 1, false).unwrap_err();
        assert_eq!(
            err,
            CursorError::BufferTooSmall {
                needed: 4,
                available: 3
            }
        );
        assert_eq!(cursor.used(), 0);
    }

    #[test]
    fn count_only_advances_without_writing() {
        let mut cursor = ByteCursor::with_len(16);
        put_varint(&mut [], &mut cursor, 300, true).unwrap();
        put_fixed64(&mut [], &mut cursor, 7, true).unwrap();
        put_slice(&mut [], &mut cursor, b"abc", true).unwrap();
        assert_eq!(cursor.used(), 2 + 8 + 3);
    }

    #[test]
    fn count_only_still_enforces_capacity() {
        let mut cursor = ByteCursor::with_len(4);
        let err = put_fixed64(&mut [], &mut cursor, 7, true).unwrap_err();
        assert!(matches!(err, CursorError::BufferTooSmall { needed: 8, .. }));
    }

    #[test]
    fn varint_failure_leaves_buffer_untouched() {
        let mut buf = [0xEEu8; 1];
        let mut cursor = ByteCursor::with_len(buf.len());
        let err = put_varint(&mut buf, &mut cursor, 300, false).unwrap_err();
        assert!(matches!(err, CursorError::BufferTooSmall { needed: 2, .. }));
        assert_eq!(buf, [0xEE]);
        assert_eq!(cursor.used(), 0);
    }

    #[test]
    fn short_backing_buffer_is_an_error_not_a_panic() {
        let mut buf = [0u8; 2];
        let mut cursor = ByteCursor::with_len(8);
        let err = put_fixed32(&mut buf, &mut cursor, 1, false).unwrap_err();
        assert_eq!(
            err,
            CursorError::BufferTooSmall {
                needed: 4,
                available: 2
            }
        );
        assert_eq!(cursor.used(), 0);
    }
}
