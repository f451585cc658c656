use cursor::{decode_varint, put_fixed64, put_varint, ByteCursor, CursorError};

#[test]
fn bounded_buffer_accepts_exact_fit() {
    let mut buf = [0u8; 10];
    let mut cursor = ByteCursor::with_len(buf.len());
    put_varint(&mut buf, &mut cursor, 300, false).unwrap();
    put_fixed64(&mut buf, &mut cursor, u64::MAX, false).unwrap();
    assert_eq!(cursor.remaining(), 0);

    let (value, used) = decode_varint(&buf).unwrap();
    assert_eq!((value, used), (300, 2));
    assert_eq!(buf[2..], [0xFF; 8]);
}

#[test]
fn bounded_buffer_rejects_one_past_fit() {
    let mut buf = [0u8; 9];
    let mut cursor = ByteCursor::with_len(buf.len());
    put_varint(&mut buf, &mut cursor, 300, false).unwrap();
    let err = put_fixed64(&mut buf, &mut cursor, u64::MAX, false).unwrap_err();
    assert_eq!(
        err,
        CursorError::BufferTooSmall {
            needed: 8,
            available: 7
        }
    );
}

#[test]
fn varints_decode_back_to_back() {
    let mut buf = [0u8; 32];
    let mut cursor = ByteCursor::with_len(buf.len());
    for value in [0u64, 127, 128, 16_383, 16_384, u64::MAX] {
        put_varint(&mut buf, &mut cursor, value, false).unwrap();
    }

    let mut offset = 0;
    let mut decoded = Vec::new();
    while offset < cursor.used() {
        let (value, used) = decode_varint(&buf[offset..cursor.used()]).unwrap();
        decoded.push(value);
        offset += used;
    }
    assert_eq!(decoded, vec![0, 127, 128, 16_383, 16_384, u64::MAX]);
}
