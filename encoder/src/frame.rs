//! Encoder stack frames.

use cursor::ByteCursor;
use schema::{FieldDesc, MessageDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    Root,
    Message,
    PackedRun,
}

/// One level of the encoder stack.
///
/// A frame holds offsets into the shared output buffer, never bytes of its
/// own. Child cursors start `NESTED_HEADER_SLOP` bytes past the parent's
/// position and share the parent's end.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame<'s> {
    pub(crate) cursor: ByteCursor,
    /// Field that opened the frame; `None` for the root.
    pub(crate) field: Option<FieldDesc<'s>>,
    /// Message whose fields may be written here. Packed runs inherit the
    /// parent's message; untyped nested messages have none.
    pub(crate) message: Option<&'s MessageDef>,
    pub(crate) kind: FrameKind,
}

impl<'s> Frame<'s> {
    pub(crate) const EMPTY: Self = Self {
        cursor: ByteCursor::new(0, 0),
        field: None,
        message: None,
        kind: FrameKind::Root,
    };

    pub(crate) const fn root(cursor: ByteCursor, message: &'s MessageDef) -> Self {
        Self {
            cursor,
            field: None,
            message: Some(message),
            kind: FrameKind::Root,
        }
    }

    /// Number of the field that opened this frame.
    pub(crate) fn number(&self) -> u32 {
        self.field.map_or(0, |field| field.number())
    }
}
