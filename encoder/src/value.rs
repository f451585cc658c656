//! Lowering typed values to wire values.

use cursor::{put_fixed32, put_fixed64, put_slice, put_varint, zigzag32, zigzag64, ByteCursor};
use schema::FieldKind;
use wire::{put_delimited_header, put_tag, Tag, WireType};

use crate::error::{EncodeResult, RequestError};

/// A value as handed to one of the `add_*` operations.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Value<'v> {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    Bool(bool),
    Enum(i32),
    F32(f32),
    F64(f64),
    Str(&'v str),
    Bytes(&'v [u8]),
}

/// A value in one of the four wire categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WireValue<'v> {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    Delimited(&'v [u8]),
}

impl<'v> Value<'v> {
    const fn name(self) -> &'static str {
        match self {
            Self::I32(_) => "int32",
            Self::I64(_) => "int64",
            Self::U32(_) => "uint32",
            Self::U64(_) => "uint64",
            Self::Bool(_) => "bool",
            Self::Enum(_) => "enum",
            Self::F32(_) => "float",
            Self::F64(_) => "double",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Encodes the value as `kind` requires.
    ///
    /// Narrower values widen into wider kinds (an `i32` into `sint64`, an
    /// `f32` into `double`); anything that would lose information is
    /// rejected.
    pub(crate) fn lower(self, number: u32, kind: FieldKind) -> EncodeResult<WireValue<'v>> {
        use FieldKind as K;

        let lowered = match (self, kind) {
            (Self::I32(v) | Self::Enum(v), K::Int32 | K::Int64 | K::Enum) => {
                Some(WireValue::Varint(i64::from(v) as u64))
            }
            (Self::I32(v), K::Sint32) => Some(WireValue::Varint(u64::from(zigzag32(v)))),
            (Self::I32(v), K::Sint64) => Some(WireValue::Varint(zigzag64(i64::from(v)))),
            (Self::I32(v), K::Sfixed32) => Some(WireValue::Fixed32(v as u32)),
            (Self::I32(v), K::Sfixed64) => Some(WireValue::Fixed64(i64::from(v) as u64)),
            (Self::I64(v), K::Int64) => Some(WireValue::Varint(v as u64)),
            (Self::I64(v), K::Sint64) => Some(WireValue::Varint(zigzag64(v))),
            (Self::I64(v), K::Sfixed64) => Some(WireValue::Fixed64(v as u64)),
            (Self::U32(v), K::Uint32 | K::Uint64) => Some(WireValue::Varint(u64::from(v))),
            (Self::U32(v), K::Fixed32) => Some(WireValue::Fixed32(v)),
            (Self::U32(v), K::Fixed64) => Some(WireValue::Fixed64(u64::from(v))),
            (Self::U64(v), K::Uint64) => Some(WireValue::Varint(v)),
            (Self::U64(v), K::Fixed64) => Some(WireValue::Fixed64(v)),
            (Self::Bool(v), K::Bool) => Some(WireValue::Varint(u64::from(v))),
            (Self::F32(v), K::Float) => Some(WireValue::Fixed32(v.to_bits())),
            (Self::F32(v), K::Double) => Some(WireValue::Fixed64(f64::from(v).to_bits())),
            (Self::F64(v), K::Double) => Some(WireValue::Fixed64(v.to_bits())),
            (Self::Str(v), K::String | K::Bytes) => Some(WireValue::Delimited(v.as_bytes())),
            (Self::Bytes(v), K::Bytes | K::String | K::Message) => {
                Some(WireValue::Delimited(v))
            }
            _ => None,
        };

        lowered.ok_or_else(|| {
            RequestError::KindMismatch {
                number,
                kind,
                value: self.name(),
            }
            .into()
        })
    }
}

impl WireValue<'_> {
    pub(crate) const fn wire_type(self) -> WireType {
        match self {
            Self::Varint(_) => WireType::Varint,
            Self::Fixed32(_) => WireType::Fixed32,
            Self::Fixed64(_) => WireType::Fixed64,
            Self::Delimited(_) => WireType::LengthDelimited,
        }
    }
}

/// Writes `value`, preceded by a tag when `number` is given.
///
/// Not atomic: a failure part way leaves the tag written. Callers rewind.
pub(crate) fn put_value(
    out: &mut [u8],
    cursor: &mut ByteCursor,
    number: Option<u32>,
    value: WireValue<'_>,
    count_only: bool,
) -> EncodeResult<()> {
    if let WireValue::Delimited(bytes) = value {
        match number {
            Some(number) => {
                put_delimited_header(out, cursor, number, bytes.len(), count_only)?;
            }
            None => {
                put_varint(out, cursor, bytes.len() as u64, count_only)?;
            }
        }
        put_slice(out, cursor, bytes, count_only)?;
        return Ok(());
    }

    if let Some(number) = number {
        put_tag(out, cursor, Tag::new(number, value.wire_type())?, count_only)?;
    }
    match value {
        WireValue::Varint(v) => {
            put_varint(out, cursor, v, count_only)?;
        }
        WireValue::Fixed32(v) => put_fixed32(out, cursor, v, count_only)?,
        WireValue::Fixed64(v) => put_fixed64(out, cursor, v, count_only)?,
        WireValue::Delimited(_) => {}
    }
    Ok(())
}
