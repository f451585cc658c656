//! Wire types, field numbers and tags.

use std::fmt;

use crate::error::{WireError, WireResult};

/// Largest field number a tag can carry (29 bits).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Maximum encoded length of a tag varint.
pub const MAX_TAG_LEN: usize = 5;

/// Maximum encoded length of a length prefix (lengths are bounded by `u32`).
pub const MAX_LENGTH_PREFIX_LEN: usize = 5;

/// Worst-case size of a length-delimited field header (tag + length).
///
/// Nested frames reserve this many bytes in their parent so the header can be
/// written in front of the payload once the payload length is known.
pub const MAX_FIELD_HEADER_LEN: usize = MAX_TAG_LEN + MAX_LENGTH_PREFIX_LEN;

/// The 3-bit category in a tag that says how the value's bytes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum WireType {
    /// Base-128 varint.
    Varint = 0,
    /// Little-endian 64-bit value.
    Fixed64 = 1,
    /// Varint length followed by that many bytes.
    LengthDelimited = 2,
    /// Little-endian 32-bit value.
    Fixed32 = 5,
}

impl WireType {
    /// Parses a wire type from the low three bits of a tag.
    pub const fn parse(raw: u8) -> WireResult<Self> {
        match raw {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            5 => Ok(Self::Fixed32),
            _ => Err(WireError::InvalidWireType { raw }),
        }
    }

    /// Returns the raw 3-bit value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Returns `true` if values of this wire type may be packed.
    #[must_use]
    pub const fn is_packable(self) -> bool {
        !matches!(self, Self::LengthDelimited)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Varint => "varint",
            Self::Fixed64 => "64-bit",
            Self::LengthDelimited => "length-delimited",
            Self::Fixed32 => "32-bit",
        };
        write!(f, "{name}")
    }
}

/// A field tag: `(field_number << 3) | wire_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    number: u32,
    wire_type: WireType,
}

impl Tag {
    /// Creates a tag, validating the field number.
    pub const fn new(number: u32, wire_type: WireType) -> WireResult<Self> {
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(WireError::InvalidFieldNumber {
                number: number as u64,
            });
        }
        Ok(Self { number, wire_type })
    }

    /// Splits a raw tag value into field number and wire type.
    pub const fn from_raw(raw: u64) -> WireResult<Self> {
        let wire_type = match WireType::parse((raw & 0x7) as u8) {
            Ok(wire_type) => wire_type,
            Err(err) => return Err(err),
        };
        let number = raw >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER as u64 {
            return Err(WireError::InvalidFieldNumber { number });
        }
        Ok(Self {
            number: number as u32,
            wire_type,
        })
    }

    /// Returns the field number.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Returns the wire type.
    #[must_use]
    pub const fn wire_type(self) -> WireType {
        self.wire_type
    }

    /// Returns the raw tag value as written on the wire.
    #[must_use]
    pub const fn raw(self) -> u64 {
        ((self.number as u64) << 3) | self.wire_type as u64
    }

    /// Returns the encoded length of this tag.
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        cursor::varint_len(self.raw())
    }
}
