//! Error types for cursor and primitive codec operations.

use std::fmt;

/// Result type for cursor operations.
pub type CursorResult<T> = Result<T, CursorError>;

/// Errors that can occur while writing through or decoding with a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// The cursor (or input) cannot hold the requested number of bytes.
    BufferTooSmall {
        /// Number of bytes the operation needed.
        needed: usize,
        /// Number of bytes that were available.
        available: usize,
    },

    /// No input bytes were supplied to a decode operation.
    EmptyInput,
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { needed, available } => {
                write!(
                    f,
                    "buffer too small: need {needed} bytes but only {available} available"
                )
            }
            Self::EmptyInput => write!(f, "no input bytes to decode"),
        }
    }
}

impl std::error::Error for CursorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_buffer_too_small() {
        let err = CursorError::BufferTooSmall {
            needed: 8,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("8 bytes"), "should mention needed bytes");
        assert!(msg.contains("3 available"), "should mention available bytes");
    }

    #[test]
    fn error_display_empty_input() {
        let msg = CursorError::EmptyInput.to_string();
        assert!(msg.contains("no input"));
    }

    #[test]
    fn error_equality() {
        let err1 = CursorError::BufferTooSmall {
            needed: 8,
            available: 3,
        };
        let err2 = CursorError::BufferTooSmall {
            needed: 8,
            available: 3,
        };
        let err3 = CursorError::BufferTooSmall {
            needed: 8,
            available: 4,
        };
        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
        assert_ne!(err1, CursorError::EmptyInput);
    }

    #[test]
    fn error_debug() {
        let debug = format!("{:?}", CursorError::EmptyInput);
        assert!(debug.contains("EmptyInput"));
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<CursorError>();
    }
}
