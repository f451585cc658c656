//! Field descriptors: value kinds, labels, flags, and the typed/untyped split.

use std::fmt;

use wire::WireType;

use crate::MessageId;

/// The value category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum FieldKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    Enum,
    String,
    Bytes,
    Message,
}

impl FieldKind {
    /// Returns the wire type values of this kind are encoded with.
    #[must_use]
    pub const fn wire_type(self) -> WireType {
        match self {
            Self::Int32
            | Self::Int64
            | Self::Uint32
            | Self::Uint64
            | Self::Sint32
            | Self::Sint64
            | Self::Bool
            | Self::Enum => WireType::Varint,
            Self::Double | Self::Fixed64 | Self::Sfixed64 => WireType::Fixed64,
            Self::Float | Self::Fixed32 | Self::Sfixed32 => WireType::Fixed32,
            Self::String | Self::Bytes | Self::Message => WireType::LengthDelimited,
        }
    }

    /// Returns the lowercase schema name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::Enum => "enum",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field cardinality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Label {
    Required,
    #[default]
    Optional,
    Repeated,
}

/// Field option bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct FieldFlags(u8);

impl FieldFlags {
    /// Repeated scalar values are written as one length-delimited run.
    pub const PACKED: u8 = 1 << 0;

    /// The field is deprecated; writes require an explicit override.
    pub const DEPRECATED: u8 = 1 << 1;

    /// The schema declares a default value for the field.
    pub const HAS_DEFAULT: u8 = 1 << 2;

    /// Creates flags from raw bits.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_packed(self) -> bool {
        self.0 & Self::PACKED != 0
    }

    #[must_use]
    pub const fn is_deprecated(self) -> bool {
        self.0 & Self::DEPRECATED != 0
    }

    #[must_use]
    pub const fn has_default(self) -> bool {
        self.0 & Self::HAS_DEFAULT != 0
    }

    #[must_use]
    const fn with(self, bit: u8) -> Self {
        Self(self.0 | bit)
    }
}

/// A field definition owned by a message in a [`Schema`](crate::Schema).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDef {
    pub name: String,
    pub number: u32,
    pub kind: FieldKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: Label,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: FieldFlags,
    /// Message type of a `Message` field.
    #[cfg_attr(feature = "serde", serde(default))]
    pub message: Option<MessageId>,
}

impl FieldDef {
    /// Creates an optional scalar field.
    #[must_use]
    pub fn new(name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            number,
            kind,
            label: Label::Optional,
            flags: FieldFlags::default(),
            message: None,
        }
    }

    /// Creates an optional field holding a nested message.
    #[must_use]
    pub fn message(name: impl Into<String>, number: u32, message: MessageId) -> Self {
        Self {
            message: Some(message),
            ..Self::new(name, number, FieldKind::Message)
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.label = Label::Required;
        self
    }

    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    /// Marks the field repeated and packed.
    #[must_use]
    pub fn packed(mut self) -> Self {
        self.label = Label::Repeated;
        self.flags = self.flags.with(FieldFlags::PACKED);
        self
    }

    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.flags = self.flags.with(FieldFlags::DEPRECATED);
        self
    }

    #[must_use]
    pub fn with_default(mut self) -> Self {
        self.flags = self.flags.with(FieldFlags::HAS_DEFAULT);
        self
    }

    /// Returns the wire type of this field's values.
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        self.kind.wire_type()
    }
}

/// A field that is not bound to any message descriptor.
///
/// Untyped fields skip membership validation; they carry dynamically typed
/// payloads whose schema the encoder does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UntypedField {
    pub number: u32,
    pub kind: FieldKind,
    pub packed: bool,
}

impl UntypedField {
    #[must_use]
    pub const fn new(number: u32, kind: FieldKind) -> Self {
        Self {
            number,
            kind,
            packed: false,
        }
    }

    #[must_use]
    pub const fn packed(mut self) -> Self {
        self.packed = true;
        self
    }
}

/// The field an encoder operation targets.
///
/// `Typed` fields must belong to the message being encoded; `Untyped` fields
/// are written without that check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDesc<'s> {
    Typed(&'s FieldDef),
    Untyped(UntypedField),
}

impl FieldDesc<'_> {
    #[must_use]
    pub const fn number(&self) -> u32 {
        match self {
            Self::Typed(def) => def.number,
            Self::Untyped(field) => field.number,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Typed(def) => def.kind,
            Self::Untyped(field) => field.kind,
        }
    }

    #[must_use]
    pub const fn is_packed(&self) -> bool {
        match self {
            Self::Typed(def) => def.flags.is_packed(),
            Self::Untyped(field) => field.packed,
        }
    }

    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        match self {
            Self::Typed(def) => def.flags.is_deprecated(),
            Self::Untyped(_) => false,
        }
    }

    /// Returns the nested message type, if this is a typed message field.
    #[must_use]
    pub const fn message(&self) -> Option<MessageId> {
        match self {
            Self::Typed(def) => def.message,
            Self::Untyped(_) => None,
        }
    }

    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        self.kind().wire_type()
    }
}

impl<'s> From<&'s FieldDef> for FieldDesc<'s> {
    fn from(def: &'s FieldDef) -> Self {
        Self::Typed(def)
    }
}

impl From<UntypedField> for FieldDesc<'_> {
    fn from(field: UntypedField) -> Self {
        Self::Untyped(field)
    }
}
