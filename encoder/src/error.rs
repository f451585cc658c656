//! Error types for encoder operations.

use std::fmt;

use cursor::CursorError;
use schema::FieldKind;
use wire::{WireError, WireType};

/// Result type for encoder operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors that can occur while encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The active frame cannot hold the bytes an operation needs.
    BufferTooSmall { needed: usize, available: usize },

    /// Opening another frame would exceed the configured nesting depth.
    InsufficientResources { depth: u8, max_depth: u8 },

    /// The call is not valid for the encoder's state or schema.
    InvalidRequest(RequestError),

    /// An input slice that must hold at least one byte was empty.
    InvalidPointer,

    /// The output buffer could not be allocated.
    NoMemory { requested: usize },
}

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// The encoder was released or aborted by a flush sink.
    Disabled,

    /// `nested_start` on a field whose kind is not `message`.
    NotAMessage { number: u32, kind: FieldKind },

    /// A typed field that does not belong to the active message.
    NotInMessage { number: u32 },

    /// A typed field was written inside an untyped nested message.
    NoMessageContext { number: u32 },

    /// The value does not fit the field's kind.
    KindMismatch {
        number: u32,
        kind: FieldKind,
        value: &'static str,
    },

    /// `nested_end` with only the root frame open.
    CannotCloseRoot,

    /// A spliced field number is not part of the active message.
    UnknownField { number: u32 },

    /// A field header carries the wrong wire type for the operation.
    UnexpectedWireType { expected: WireType, found: WireType },

    /// `unwind_to(0)`: the root frame is never closed by unwinding.
    InvalidDepth { target: u8 },

    /// A packed field has a length-delimited kind.
    PackedLengthDelimited { number: u32 },

    /// The message type of a nested or root message is not in the schema.
    UnknownMessage,

    /// A field number outside `1..=MAX_FIELD_NUMBER`.
    InvalidFieldNumber { number: u64 },

    /// A spliced tag names a wire type the format does not use.
    InvalidWireType { raw: u8 },

    /// A spliced field header could not be parsed.
    MalformedField,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { needed, available } => {
                write!(f, "buffer too small: need {needed}, have {available}")
            }
            Self::InsufficientResources { depth, max_depth } => {
                write!(f, "nesting limit reached: depth {depth} of {max_depth}")
            }
            Self::InvalidRequest(reason) => write!(f, "invalid request: {reason}"),
            Self::InvalidPointer => write!(f, "empty input"),
            Self::NoMemory { requested } => {
                write!(f, "failed to allocate {requested} byte output buffer")
            }
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "encoder is disabled"),
            Self::NotAMessage { number, kind } => {
                write!(f, "field {number} is {kind}, not message")
            }
            Self::NotInMessage { number } => {
                write!(f, "field {number} does not belong to the active message")
            }
            Self::NoMessageContext { number } => {
                write!(f, "typed field {number} written inside an untyped message")
            }
            Self::KindMismatch {
                number,
                kind,
                value,
            } => {
                write!(f, "field {number} is {kind}, cannot hold {value} value")
            }
            Self::CannotCloseRoot => write!(f, "cannot close the root message"),
            Self::UnknownField { number } => {
                write!(f, "field {number} is not part of the active message")
            }
            Self::UnexpectedWireType { expected, found } => {
                write!(f, "expected {expected} wire type, found {found}")
            }
            Self::InvalidDepth { target } => write!(f, "cannot unwind to depth {target}"),
            Self::PackedLengthDelimited { number } => {
                write!(f, "packed field {number} is length-delimited")
            }
            Self::UnknownMessage => write!(f, "message type is not in the schema"),
            Self::InvalidFieldNumber { number } => write!(f, "invalid field number {number}"),
            Self::InvalidWireType { raw } => write!(f, "invalid wire type {raw}"),
            Self::MalformedField => write!(f, "malformed field header"),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<RequestError> for EncodeError {
    fn from(reason: RequestError) -> Self {
        Self::InvalidRequest(reason)
    }
}

impl From<CursorError> for EncodeError {
    fn from(err: CursorError) -> Self {
        match err {
            CursorError::BufferTooSmall { needed, available } => {
                Self::BufferTooSmall { needed, available }
            }
            CursorError::EmptyInput => Self::InvalidPointer,
        }
    }
}

impl From<WireError> for EncodeError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Cursor(err) => err.into(),
            WireError::Truncated { claimed, available } => Self::BufferTooSmall {
                needed: claimed,
                available,
            },
            WireError::UnexpectedWireType { expected, found } => {
                RequestError::UnexpectedWireType { expected, found }.into()
            }
            WireError::InvalidFieldNumber { number } => {
                RequestError::InvalidFieldNumber { number }.into()
            }
            WireError::InvalidWireType { raw } => RequestError::InvalidWireType { raw }.into(),
            WireError::LengthOverflow { .. } => Self::BufferTooSmall {
                needed: usize::MAX,
                available: 0,
            },
            _ => RequestError::MalformedField.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_buffer_too_small() {
        let msg = EncodeError::BufferTooSmall {
            needed: 12,
            available: 4,
        }
        .to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains('4'));
    }

    #[test]
    fn display_kind_mismatch() {
        let err = EncodeError::InvalidRequest(RequestError::KindMismatch {
            number: 3,
            kind: FieldKind::Bool,
            value: "string",
        });
        assert_eq!(
            err.to_string(),
            "invalid request: field 3 is bool, cannot hold string value"
        );
    }

    #[test]
    fn cursor_errors_map_to_kinds() {
        assert_eq!(
            EncodeError::from(CursorError::EmptyInput),
            EncodeError::InvalidPointer
        );
        assert_eq!(
            EncodeError::from(CursorError::BufferTooSmall {
                needed: 2,
                available: 1
            }),
            EncodeError::BufferTooSmall {
                needed: 2,
                available: 1
            }
        );
    }

    #[test]
    fn truncated_splice_is_buffer_too_small() {
        let err = EncodeError::from(WireError::Truncated {
            claimed: 9,
            available: 3,
        });
        assert_eq!(
            err,
            EncodeError::BufferTooSmall {
                needed: 9,
                available: 3
            }
        );
    }

    #[test]
    fn wire_type_errors_are_requests() {
        let err = EncodeError::from(WireError::UnexpectedWireType {
            expected: WireType::LengthDelimited,
            found: WireType::Varint,
        });
        assert!(matches!(
            err,
            EncodeError::InvalidRequest(RequestError::UnexpectedWireType { .. })
        ));
    }
}
