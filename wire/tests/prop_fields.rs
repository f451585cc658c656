use cursor::{put_slice, ByteCursor};
use proptest::prelude::*;
use wire::{
    decode_tag, put_delimited_header, put_tag, split_delimited_field, Tag, WireType,
    MAX_FIELD_NUMBER,
};

fn wire_type_strategy() -> impl Strategy<Value = WireType> {
    prop_oneof![
        Just(WireType::Varint),
        Just(WireType::Fixed64),
        Just(WireType::LengthDelimited),
        Just(WireType::Fixed32),
    ]
}

proptest! {
    #[test]
    fn prop_tag_roundtrip(number in 1u32..=MAX_FIELD_NUMBER, wire_type in wire_type_strategy()) {
        let tag = Tag::new(number, wire_type).unwrap();
        let mut buf = [0u8; 8];
        let mut cursor = ByteCursor::with_len(buf.len());
        let len = put_tag(&mut buf, &mut cursor, tag, false).unwrap();
        prop_assert_eq!(len, tag.encoded_len());
        prop_assert_eq!(decode_tag(&buf[..len]).unwrap(), (tag, len));
    }

    #[test]
    fn prop_delimited_roundtrip(
        number in 1u32..=MAX_FIELD_NUMBER,
        payload in prop::collection::vec(any::<u8>(), 0..300),
    ) {
        let mut buf = vec![0u8; payload.len() + 16];
        let mut cursor = ByteCursor::with_len(buf.len());
        put_delimited_header(&mut buf, &mut cursor, number, payload.len(), false).unwrap();
        put_slice(&mut buf, &mut cursor, &payload, false).unwrap();

        let field = split_delimited_field(&buf[..cursor.used()]).unwrap();
        prop_assert_eq!(field.tag.number(), number);
        prop_assert_eq!(field.payload, payload.as_slice());
    }
}
