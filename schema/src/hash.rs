//! Deterministic schema hashing.

use blake3::Hasher;

use crate::{FieldDef, Label, MessageDef, Schema};

/// Computes a deterministic fingerprint of a schema.
///
/// Two schemas hash equal when their messages, fields, and field options
/// match in order. Field and message names participate, so renames change
/// the fingerprint even though they do not change the encoded bytes.
#[must_use]
pub fn schema_hash(schema: &Schema) -> u64 {
    let mut hasher = Hasher::new();
    write_u32(&mut hasher, schema.messages.len() as u32);

    for message in &schema.messages {
        write_message(&mut hasher, message);
    }

    let hash = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

fn write_message(hasher: &mut Hasher, message: &MessageDef) {
    write_str(hasher, &message.name);
    write_u32(hasher, message.fields.len() as u32);
    for field in &message.fields {
        write_field(hasher, field);
    }
}

fn write_field(hasher: &mut Hasher, field: &FieldDef) {
    write_str(hasher, &field.name);
    write_u32(hasher, field.number);
    write_str(hasher, field.kind.name());
    write_u8(
        hasher,
        match field.label {
            Label::Required => 0,
            Label::Optional => 1,
            Label::Repeated => 2,
        },
    );
    write_u8(hasher, field.flags.raw());
    match field.message {
        Some(id) => {
            write_u8(hasher, 1);
            write_u16(hasher, id.get());
        }
        None => write_u8(hasher, 0),
    }
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u16(hasher: &mut Hasher, value: u16) {
    hasher.update(&value.to_le_bytes());
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldKind, MessageId};

    fn sample() -> Schema {
        let inner = MessageDef::new("Inner").field(FieldDef::new("flag", 1, FieldKind::Bool));
        let outer = MessageDef::new("Outer")
            .field(FieldDef::new("count", 1, FieldKind::Uint32))
            .field(FieldDef::message("inner", 2, MessageId::new(0)));
        Schema::new(vec![inner, outer]).unwrap()
    }

    #[test]
    fn schema_hash_is_stable() {
        let schema = sample();
        assert_eq!(schema_hash(&schema), schema_hash(&schema.clone()));
    }

    #[test]
    fn schema_hash_changes_with_field_order() {
        let a = MessageDef::new("M")
            .field(FieldDef::new("a", 1, FieldKind::Bool))
            .field(FieldDef::new("b", 2, FieldKind::Uint32));
        let b = MessageDef::new("M")
            .field(FieldDef::new("b", 2, FieldKind::Uint32))
            .field(FieldDef::new("a", 1, FieldKind::Bool));

        let schema_a = Schema::new(vec![a]).unwrap();
        let schema_b = Schema::new(vec![b]).unwrap();
        assert_ne!(schema_hash(&schema_a), schema_hash(&schema_b));
    }

    #[test]
    fn schema_hash_changes_with_flags() {
        let plain = Schema::new(vec![
            MessageDef::new("M").field(FieldDef::new("ids", 1, FieldKind::Uint32).repeated())
        ])
        .unwrap();
        let packed = Schema::new(vec![
            MessageDef::new("M").field(FieldDef::new("ids", 1, FieldKind::Uint32).packed())
        ])
        .unwrap();
        assert_ne!(schema_hash(&plain), schema_hash(&packed));
    }

    #[test]
    fn schema_hash_changes_with_kind() {
        let a = Schema::new(vec![
            MessageDef::new("M").field(FieldDef::new("v", 1, FieldKind::Int32))
        ])
        .unwrap();
        let b = Schema::new(vec![
            MessageDef::new("M").field(FieldDef::new("v", 1, FieldKind::Sint32))
        ])
        .unwrap();
        assert_ne!(schema_hash(&a), schema_hash(&b));
    }
}
