//! Schema validation errors.

use std::fmt;

use crate::MessageId;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when building or validating a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two messages share a name.
    DuplicateMessageName { name: String },

    /// Two fields of one message share a field number.
    DuplicateFieldNumber { message: MessageId, number: u32 },

    /// Field number outside `1..=MAX_FIELD_NUMBER`.
    InvalidFieldNumber { message: MessageId, number: u32 },

    /// A message-typed field does not name its message type.
    MissingMessageType { message: MessageId, number: u32 },

    /// A scalar field names a message type.
    UnexpectedMessageType { message: MessageId, number: u32 },

    /// A field refers to a message id that is not in the schema.
    UnknownMessage { message: MessageId, number: u32, target: MessageId },

    /// A packed field is not repeated.
    PackedNotRepeated { message: MessageId, number: u32 },

    /// A packed field has a length-delimited value kind.
    PackedLengthDelimited { message: MessageId, number: u32 },

    /// More messages than a `MessageId` can address.
    TooManyMessages { count: usize },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateMessageName { name } => write!(f, "duplicate message name {name:?}"),
            Self::DuplicateFieldNumber { message, number } => {
                write!(f, "duplicate field number {number} in message {message}")
            }
            Self::InvalidFieldNumber { message, number } => {
                write!(f, "invalid field number {number} in message {message}")
            }
            Self::MissingMessageType { message, number } => {
                write!(f, "message field {number} in message {message} has no message type")
            }
            Self::UnexpectedMessageType { message, number } => {
                write!(f, "scalar field {number} in message {message} names a message type")
            }
            Self::UnknownMessage {
                message,
                number,
                target,
            } => {
                write!(
                    f,
                    "field {number} in message {message} refers to unknown message {target}"
                )
            }
            Self::PackedNotRepeated { message, number } => {
                write!(f, "packed field {number} in message {message} is not repeated")
            }
            Self::PackedLengthDelimited { message, number } => {
                write!(
                    f,
                    "packed field {number} in message {message} is length-delimited"
                )
            }
            Self::TooManyMessages { count } => write!(f, "too many messages: {count}"),
        }
    }
}

impl std::error::Error for SchemaError {}
