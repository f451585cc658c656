//! Field header encoding and length-delimited field parsing.

use cursor::{decode_varint, put_varint, ByteCursor};

use crate::error::{WireError, WireResult};
use crate::tag::{Tag, WireType};

/// A single length-delimited field parsed from the front of an encoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedField<'a> {
    /// The field's tag.
    pub tag: Tag,
    /// Bytes taken by the tag and length prefix.
    pub header_len: usize,
    /// The field's payload.
    pub payload: &'a [u8],
}

/// Decodes the tag at the front of `bytes`.
///
/// Returns the tag and the number of bytes it occupied.
pub fn decode_tag(bytes: &[u8]) -> WireResult<(Tag, usize)> {
    let (raw, used) = decode_varint(bytes)?;
    Ok((Tag::from_raw(raw)?, used))
}

/// Decodes a length prefix at the front of `bytes` and checks that the
/// claimed payload follows it in full.
///
/// Returns the payload length and the number of bytes the prefix occupied.
pub fn decode_length(bytes: &[u8]) -> WireResult<(usize, usize)> {
    let (raw, used) = decode_varint(bytes)?;
    let len = usize::try_from(raw).map_err(|_| WireError::LengthOverflow { length: raw })?;
    let available = bytes.len() - used;
    if len > available {
        return Err(WireError::Truncated {
            claimed: len,
            available,
        });
    }
    Ok((len, used))
}

/// Parses the first field of `bytes`, which must be length-delimited.
///
/// Bytes after the field's payload are ignored.
pub fn split_delimited_field(bytes: &[u8]) -> WireResult<DelimitedField<'_>> {
    let (tag, tag_len) = decode_tag(bytes)?;
    if tag.wire_type() != WireType::LengthDelimited {
        return Err(WireError::UnexpectedWireType {
            expected: WireType::LengthDelimited,
            found: tag.wire_type(),
        });
    }
    let (len, len_len) = decode_length(&bytes[tag_len..])?;
    let header_len = tag_len + len_len;
    Ok(DelimitedField {
        tag,
        header_len,
        payload: &bytes[header_len..header_len + len],
    })
}

/// Writes a tag.
pub fn put_tag(
    out: &mut [u8],
    cursor: &mut ByteCursor,
    tag: Tag,
    count_only: bool,
) -> WireResult<usize> {
    Ok(put_varint(out, cursor, tag.raw(), count_only)?)
}

/// Writes the tag and length prefix of a length-delimited field.
///
/// Nothing is written unless both fit.
pub fn put_delimited_header(
    out: &mut [u8],
    cursor: &mut ByteCursor,
    number: u32,
    payload_len: usize,
    count_only: bool,
) -> WireResult<usize> {
    let tag = Tag::new(number, WireType::LengthDelimited)?;
    let len = payload_len as u64;
    cursor.ensure(delimited_header_len(tag, payload_len))?;
    let tag_len = put_tag(out, cursor, tag, count_only)?;
    let len_len = put_varint(out, cursor, len, count_only)?;
    Ok(tag_len + len_len)
}

/// Returns the size of the tag and length prefix for a delimited field.
#[must_use]
pub const fn delimited_header_len(tag: Tag, payload_len: usize) -> usize {
    tag.encoded_len() + cursor::varint_len(payload_len as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cursor::CursorError;

    #[test]
    fn split_nested_message_field() {
        let bytes = [0x12, 0x02, 0x08, 0x01];
        let field = split_delimited_field(&bytes).unwrap();
        assert_eq!(field.tag.number(), 2);
        assert_eq!(field.header_len, 2);
        assert_eq!(field.payload, &[0x08, 0x01]);
    }

    #[test]
    fn split_ignores_trailing_bytes() {
        let bytes = [0x0A, 0x01, 0xAA, 0x08, 0x01];
        let field = split_delimited_field(&bytes).unwrap();
        assert_eq!(field.payload, &[0xAA]);
    }

    #[test]
    fn split_rejects_varint_field() {
        let err = split_delimited_field(&[0x08, 0x01]).unwrap_err();
        assert_eq!(
            err,
            WireError::UnexpectedWireType {
                expected: WireType::LengthDelimited,
                found: WireType::Varint,
            }
        );
    }

    #[test]
    fn split_rejects_overlong_length() {
        let err = split_delimited_field(&[0x0A, 0x05, 0x01, 0x02]).unwrap_err();
        assert_eq!(
            err,
            WireError::Truncated {
                claimed: 5,
                available: 2
            }
        );
    }

    #[test]
    fn split_rejects_missing_length() {
        let err = split_delimited_field(&[0x0A]).unwrap_err();
        assert_eq!(err, WireError::Cursor(CursorError::EmptyInput));
    }

    #[test]
    fn split_rejects_empty_input() {
        let err = split_delimited_field(&[]).unwrap_err();
        assert_eq!(err, WireError::Cursor(CursorError::EmptyInput));
    }

    #[test]
    fn split_rejects_group_wire_type() {
        let err = split_delimited_field(&[0x0B, 0x00]).unwrap_err();
        assert_eq!(err, WireError::InvalidWireType { raw: 3 });
    }

    #[test]
    fn put_delimited_header_writes_tag_and_length() {
        let mut buf = [0u8; 8];
        let mut cursor = ByteCursor::with_len(buf.len());
        let len = put_delimited_header(&mut buf, &mut cursor, 2, 300, false).unwrap();
        assert_eq!(len, 3);
        assert_eq!(&buf[..3], &[0x12, 0xAC, 0x02]);
    }

    #[test]
    fn put_delimited_header_is_all_or_nothing() {
        let mut buf = [0u8; 2];
        let mut cursor = ByteCursor::with_len(buf.len());
        let err = put_delimited_header(&mut buf, &mut cursor, 2, 300, false).unwrap_err();
        assert!(matches!(
            err,
            WireError::Cursor(CursorError::BufferTooSmall { needed: 3, .. })
        ));
        assert_eq!(cursor.used(), 0);
        assert_eq!(buf, [0, 0]);
    }

    #[test]
    fn header_len_matches_written() {
        let tag = Tag::new(1000, WireType::LengthDelimited).unwrap();
        assert_eq!(delimited_header_len(tag, 127), 2 + 1);
        assert_eq!(delimited_header_len(tag, 128), 2 + 2);
    }
}
