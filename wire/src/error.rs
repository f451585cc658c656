//! Error types for wire format operations.

use std::fmt;

use cursor::CursorError;

use crate::tag::WireType;

/// Result type for wire format operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while building or parsing field headers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WireError {
    /// The low three bits of a tag name a wire type this format does not use.
    InvalidWireType { raw: u8 },

    /// Field number outside `1..=MAX_FIELD_NUMBER`.
    InvalidFieldNumber { number: u64 },

    /// A field had a different wire type than the operation requires.
    UnexpectedWireType { expected: WireType, found: WireType },

    /// A length prefix does not fit in `usize`.
    LengthOverflow { length: u64 },

    /// A length prefix claims more payload than the input holds.
    Truncated { claimed: usize, available: usize },

    /// Underlying cursor or varint error.
    Cursor(CursorError),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWireType { raw } => write!(f, "invalid wire type: {raw}"),
            Self::InvalidFieldNumber { number } => {
                write!(f, "invalid field number: {number}")
            }
            Self::UnexpectedWireType { expected, found } => {
                write!(f, "expected {expected} wire type, found {found}")
            }
            Self::LengthOverflow { length } => write!(f, "length overflow: {length}"),
            Self::Truncated { claimed, available } => {
                write!(
                    f,
                    "truncated field: length prefix claims {claimed} bytes, {available} available"
                )
            }
            Self::Cursor(err) => write!(f, "cursor error: {err}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Cursor(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CursorError> for WireError {
    fn from(err: CursorError) -> Self {
        Self::Cursor(err)
    }
}
