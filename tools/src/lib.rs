//! Schema and encoding tools for the prbuf encoder.
//!
//! This crate drives the encoder from JSON so schemas and encodings can be
//! checked without writing Rust:
//!
//! - Load and validate a schema from JSON
//! - Encode a JSON value as a message, or size it with a count-only pass
//! - Print a schema fingerprint
//!
//! # Design Principles
//!
//! - **Same engine** - Encoding goes through the library encoder, never a
//!   separate code path.
//! - **Human-readable output** - Hex dumps and JSON reports.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use encoder::{Encoder, EncoderLimits};
use schema::{schema_hash, FieldDef, FieldKind, Label, MessageDef, Schema};
use serde::Serialize;
use serde_json::Value;

/// Reads and validates a JSON schema.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read schema {}", path.display()))?;
    parse_schema(&contents)
}

/// Parses and validates a JSON schema.
pub fn parse_schema(json: &str) -> Result<Schema> {
    let schema: Schema = serde_json::from_str(json).context("parse schema json")?;
    schema
        .validate()
        .map_err(|err| anyhow!("schema validation failed: {err}"))?;
    Ok(schema)
}

/// How the encode output is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTarget {
    /// Encode into an allocated buffer of this capacity.
    Buffer(usize),
    /// Count bytes only, failing past this ceiling.
    Count(usize),
}

/// Result of [`encode_json`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeReport {
    pub len: usize,
    /// Encoded bytes; `None` for a count-only pass.
    pub bytes: Option<Vec<u8>>,
}

/// Encodes `value` as message `message` of `schema`.
///
/// `value` is a JSON object keyed by field name. Repeated fields take
/// arrays, nested messages take objects, and bytes fields take a hex string
/// or an array of byte values.
pub fn encode_json(
    schema: &Schema,
    message: &str,
    value: &Value,
    target: EncodeTarget,
    limits: EncoderLimits,
) -> Result<EncodeReport> {
    let root = schema
        .message_id(message)
        .with_context(|| format!("unknown message {message:?}"))?;
    let def = schema
        .message(root)
        .with_context(|| format!("unknown message {message:?}"))?;

    let enc = match target {
        EncodeTarget::Buffer(capacity) => Encoder::start_allocating(schema, root, capacity)?,
        EncodeTarget::Count(ceiling) => Encoder::start_counting(schema, root, ceiling)?,
    };
    let mut enc = enc.with_limits(limits);
    write_message(schema, def, value, &mut enc).with_context(|| format!("encode {message}"))?;

    let finished = enc.finish()?;
    tracing::debug!(message, bytes = finished.len, "json encoded");
    Ok(EncodeReport {
        len: finished.len,
        bytes: finished.buffer,
    })
}

fn write_message<'s>(
    schema: &'s Schema,
    def: &'s MessageDef,
    value: &Value,
    enc: &mut Encoder<'s, '_>,
) -> Result<()> {
    let object = value
        .as_object()
        .with_context(|| format!("message {} expects a JSON object", def.name))?;
    for (name, value) in object {
        let field = def
            .by_name(name)
            .with_context(|| format!("message {} has no field {name:?}", def.name))?;
        match (field.label, value) {
            (Label::Repeated, Value::Array(items)) => {
                for item in items {
                    write_field(schema, field, item, enc)?;
                }
            }
            _ => write_field(schema, field, value, enc)?,
        }
    }
    Ok(())
}

fn write_field<'s>(
    schema: &'s Schema,
    field: &'s FieldDef,
    value: &Value,
    enc: &mut Encoder<'s, '_>,
) -> Result<()> {
    let name = field.name.as_str();
    match field.kind {
        FieldKind::Message => {
            let target = field
                .message
                .and_then(|id| schema.message(id))
                .with_context(|| format!("field {name} has no message type"))?;
            let depth = enc.current_depth();
            enc.nested_start(field)?;
            let body = write_message(schema, target, value, enc);
            let end = enc.unwind_to(depth);
            body?;
            end?;
        }
        FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32 => {
            let value = i32::try_from(integer(value, name)?)
                .with_context(|| format!("field {name} is out of int32 range"))?;
            enc.add_int32(field, value)?;
        }
        FieldKind::Enum => {
            let value = i32::try_from(integer(value, name)?)
                .with_context(|| format!("field {name} is out of enum range"))?;
            enc.add_enum(field, value)?;
        }
        FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64 => {
            enc.add_int64(field, integer(value, name)?)?;
        }
        FieldKind::Uint32 | FieldKind::Fixed32 => {
            let value = u32::try_from(unsigned(value, name)?)
                .with_context(|| format!("field {name} is out of uint32 range"))?;
            enc.add_uint32(field, value)?;
        }
        FieldKind::Uint64 | FieldKind::Fixed64 => {
            enc.add_uint64(field, unsigned(value, name)?)?;
        }
        FieldKind::Bool => {
            let value = value
                .as_bool()
                .with_context(|| format!("field {name} expects a boolean"))?;
            enc.add_bool(field, value)?;
        }
        FieldKind::Float => {
            let value = float(value, name)?;
            enc.add_float(field, value as f32)?;
        }
        FieldKind::Double => {
            enc.add_double(field, float(value, name)?)?;
        }
        FieldKind::String => {
            let value = value
                .as_str()
                .with_context(|| format!("field {name} expects a string"))?;
            enc.add_string(field, value)?;
        }
        FieldKind::Bytes => {
            enc.add_bytes(field, &bytes(value, name)?)?;
        }
    }
    Ok(())
}

fn integer(value: &Value, name: &str) -> Result<i64> {
    value
        .as_i64()
        .with_context(|| format!("field {name} expects an integer"))
}

fn unsigned(value: &Value, name: &str) -> Result<u64> {
    value
        .as_u64()
        .with_context(|| format!("field {name} expects a non-negative integer"))
}

fn float(value: &Value, name: &str) -> Result<f64> {
    value
        .as_f64()
        .with_context(|| format!("field {name} expects a number"))
}

fn bytes(value: &Value, name: &str) -> Result<Vec<u8>> {
    match value {
        Value::String(text) => from_hex(text).with_context(|| format!("field {name}: bad hex")),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|byte| u8::try_from(byte).ok())
                    .with_context(|| format!("field {name} expects byte values"))
            })
            .collect(),
        _ => bail!("field {name} expects a hex string or an array of bytes"),
    }
}

/// Formats bytes as lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Parses a hex string, ignoring ASCII whitespace.
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    hex::decode(digits).context("invalid hex string")
}

/// Schema summary printed by the fingerprint command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fingerprint {
    pub hash: String,
    pub messages: usize,
    pub fields: usize,
}

impl Fingerprint {
    #[must_use]
    pub fn of(schema: &Schema) -> Self {
        Self {
            hash: format!("0x{:016x}", schema_hash(schema)),
            messages: schema.messages.len(),
            fields: schema.messages.iter().map(|message| message.fields.len()).sum(),
        }
    }
}
