use cursor::{
    decode_varint, put_fixed32, put_fixed64, put_slice, put_varint, varint_len, ByteCursor,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    Bytes(Vec<u8>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u64>().prop_map(Op::Varint),
        any::<u32>().prop_map(Op::Fixed32),
        any::<u64>().prop_map(Op::Fixed64),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Op::Bytes),
    ]
}

fn apply(ops: &[Op], out: &mut [u8], cursor: &mut ByteCursor, count_only: bool) {
    for op in ops {
        match op {
            Op::Varint(v) => {
                put_varint(out, cursor, *v, count_only).unwrap();
            }
            Op::Fixed32(v) => put_fixed32(out, cursor, *v, count_only).unwrap(),
            Op::Fixed64(v) => put_fixed64(out, cursor, *v, count_only).unwrap(),
            Op::Bytes(b) => put_slice(out, cursor, b, count_only).unwrap(),
        }
    }
}

proptest! {
    #[test]
    fn prop_varint_roundtrip(value in any::<u64>()) {
        let mut buf = [0u8; 10];
        let mut cursor = ByteCursor::with_len(buf.len());
        let len = put_varint(&mut buf, &mut cursor, value, false).unwrap();
        prop_assert_eq!(len, varint_len(value));
        prop_assert_eq!(decode_varint(&buf[..len]).unwrap(), (value, len));
    }

    #[test]
    fn prop_count_only_matches_real_write(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut buf = vec![0u8; 64 * 16];
        let mut real = ByteCursor::with_len(buf.len());
        apply(&ops, &mut buf, &mut real, false);

        let mut counted = ByteCursor::with_len(buf.len());
        apply(&ops, &mut [], &mut counted, true);

        prop_assert_eq!(real.used(), counted.used());
    }
}
