use encoder::Encoder;
use proptest::prelude::*;
use schema::{FieldDef, FieldKind, MessageDef, MessageId, Schema};
use wire::split_delimited_field;

#[derive(Clone, Debug)]
enum Op {
    Value(u32),
    Delta(i32),
    Packed(u32),
    Name(String),
    Flag(bool),
    Open,
    Close,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u32>().prop_map(Op::Value),
        any::<i32>().prop_map(Op::Delta),
        any::<u32>().prop_map(Op::Packed),
        "[a-z]{0,16}".prop_map(Op::Name),
        any::<bool>().prop_map(Op::Flag),
        Just(Op::Open),
        Just(Op::Close),
    ]
}

fn node_schema() -> (Schema, MessageId) {
    let mut builder = Schema::builder();
    let node = builder.reserve();
    builder.define(
        node,
        MessageDef::new("Node")
            .field(FieldDef::new("value", 1, FieldKind::Uint32))
            .field(FieldDef::message("child", 2, node))
            .field(FieldDef::new("ids", 3, FieldKind::Uint32).packed())
            .field(FieldDef::new("name", 4, FieldKind::String))
            .field(FieldDef::new("delta", 5, FieldKind::Sint32))
            .field(FieldDef::new("flag", 6, FieldKind::Bool)),
    );
    (builder.build().unwrap(), node)
}

fn apply<'s>(schema: &'s Schema, node: MessageId, enc: &mut Encoder<'s, '_>, ops: &[Op]) {
    let field = |name: &str| schema.field(node, name).unwrap();
    for op in ops {
        match op {
            Op::Value(v) => enc.add_uint32(field("value"), *v).unwrap(),
            Op::Delta(v) => enc.add_int32(field("delta"), *v).unwrap(),
            Op::Packed(v) => enc.add_uint32(field("ids"), *v).unwrap(),
            Op::Name(s) => enc.add_string(field("name"), s).unwrap(),
            Op::Flag(b) => enc.add_bool(field("flag"), *b).unwrap(),
            Op::Open => {
                // Leave room for a packed run inside the deepest message.
                if enc.current_depth() + 1 < enc.limits().depth_limit() {
                    enc.nested_start(field("child")).unwrap();
                }
            }
            Op::Close => {
                if enc.current_depth() > 1 && !enc.in_packed_run() {
                    enc.nested_end().unwrap();
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_count_only_matches_real_length(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let (schema, node) = node_schema();

        let mut counter = Encoder::start_counting(&schema, node, 8192).unwrap();
        apply(&schema, node, &mut counter, &ops);
        let counted = counter.finish().unwrap();

        let mut buf = vec![0u8; 8192];
        let mut enc = Encoder::start(&schema, node, &mut buf).unwrap();
        apply(&schema, node, &mut enc, &ops);
        let written = enc.finish().unwrap();

        prop_assert_eq!(counted.len, written.len);
    }

    #[test]
    fn prop_packed_values_coalesce(values in prop::collection::vec(any::<u32>(), 1..64)) {
        let (schema, node) = node_schema();
        let ids = schema.field(node, "ids").unwrap();

        let mut buf = vec![0u8; 1024];
        let mut enc = Encoder::start(&schema, node, &mut buf).unwrap();
        for value in &values {
            enc.add_uint32(ids, *value).unwrap();
        }
        let len = enc.finish().unwrap().len;

        let field = split_delimited_field(&buf[..len]).unwrap();
        prop_assert_eq!(field.tag.number(), 3);
        prop_assert_eq!(field.header_len + field.payload.len(), len);

        let mut decoded = Vec::new();
        let mut rest = field.payload;
        while !rest.is_empty() {
            let (value, used) = cursor::decode_varint(rest).unwrap();
            decoded.push(value as u32);
            rest = &rest[used..];
        }
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn prop_unwind_is_idempotent(opens in 1usize..7, value in any::<u32>()) {
        let (schema, node) = node_schema();
        let child = schema.field(node, "child").unwrap();
        let field = schema.field(node, "value").unwrap();

        let mut buf = vec![0u8; 512];
        let mut enc = Encoder::start(&schema, node, &mut buf).unwrap();
        for _ in 0..opens {
            enc.nested_start(child).unwrap();
        }
        enc.add_uint32(field, value).unwrap();

        enc.unwind_to(1).unwrap();
        let remaining = enc.remaining_capacity();
        enc.unwind_to(1).unwrap();
        prop_assert_eq!(enc.current_depth(), 1);
        prop_assert_eq!(enc.remaining_capacity(), remaining);
    }
}
