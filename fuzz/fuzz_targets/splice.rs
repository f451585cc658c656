#![no_main]

use encoder::{Encoder, EncoderLimits};
use libfuzzer_sys::fuzz_target;
use schema::{FieldDef, FieldKind, MessageDef, Schema};

fn schema_one_message() -> Schema {
    let inner = MessageDef::new("Inner").field(FieldDef::new("value", 1, FieldKind::Uint32));
    let outer = MessageDef::new("Outer")
        .field(FieldDef::new("count", 1, FieldKind::Uint32))
        .field(FieldDef::message("inner", 2, schema::MessageId::new(0)).repeated())
        .field(FieldDef::new("blob", 3, FieldKind::Bytes));
    Schema::new(vec![inner, outer]).unwrap()
}

fuzz_target!(|data: &[u8]| {
    let schema = schema_one_message();
    let root = schema.message_id("Outer").unwrap();
    let capacity = data.first().map_or(0, |b| usize::from(*b));

    let mut buf = vec![0u8; capacity];
    let mut enc = Encoder::start(&schema, root, &mut buf)
        .unwrap()
        .with_limits(EncoderLimits::for_testing());
    let before = enc.remaining_capacity();
    let result = enc.concat_encoded_message(data);
    if result.is_err() {
        assert_eq!(enc.remaining_capacity(), before, "failed splice must not write");
    }
    let finished = enc.finish().unwrap();
    assert!(finished.len <= capacity);

    // A count-only pass over the same input agrees on the size.
    let mut counter = Encoder::start_counting(&schema, root, capacity).unwrap();
    let counted = counter.concat_encoded_message(data);
    assert_eq!(counted.is_ok(), result.is_ok());
    assert_eq!(counter.finish().unwrap().len, finished.len);
});
