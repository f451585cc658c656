//! Bounds-tracked write cursor over a byte range.

use std::ops::Range;

use crate::error::{CursorError, CursorResult};

/// A write cursor over the range `base..end` of some output buffer.
///
/// The cursor only tracks offsets; the bytes live in whatever buffer the
/// caller pairs it with. This lets a stack of cursors carve nested regions
/// out of one allocation, and lets the same cursor drive a count-only pass
/// where nothing is written at all.
///
/// Invariant: `base <= position <= end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteCursor {
    base: usize,
    pos: usize,
    end: usize,
}

impl ByteCursor {
    /// Creates a cursor spanning `base..end`, positioned at `base`.
    ///
    /// If `end < base` the cursor is empty at `base`.
    #[must_use]
    pub const fn new(base: usize, end: usize) -> Self {
        let end = if end < base { base } else { end };
        Self {
            base,
            pos: base,
            end,
        }
    }

    /// Creates a cursor over `0..len`.
    #[must_use]
    pub const fn with_len(len: usize) -> Self {
        Self::new(0, len)
    }

    /// Returns the start of the cursor's range.
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Returns the current write position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the exclusive end of the cursor's range.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Returns the number of bytes written since `base`.
    #[must_use]
    pub const fn used(&self) -> usize {
        self.pos - self.base
    }

    /// Returns the number of bytes that can still be written.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Returns the range of bytes written so far.
    #[must_use]
    pub const fn written(&self) -> Range<usize> {
        self.base..self.pos
    }

    /// Checks that `len` more bytes fit.
    pub const fn ensure(&self, len: usize) -> CursorResult<()> {
        if len > self.remaining() {
            return Err(CursorError::BufferTooSmall {
                needed: len,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Advances the position by `len` bytes and returns the claimed range.
    pub fn advance(&mut self, len: usize) -> CursorResult<Range<usize>> {
        self.ensure(len)?;
        let start = self.pos;
        self.pos += len;
        Ok(start..self.pos)
    }

    /// Returns a cursor over this cursor's unwritten tail, skipping `skip`
    /// bytes past the current position.
    ///
    /// This cursor is not advanced; the caller owns the reservation until the
    /// child's bytes are folded back.
    pub const fn split_tail(&self, skip: usize) -> CursorResult<Self> {
        if let Err(err) = self.ensure(skip) {
            return Err(err);
        }
        Ok(Self::new(self.pos + skip, self.end))
    }

    /// Moves the position back to `pos`, discarding anything written after it.
    ///
    /// Positions outside `base..=position` are clamped into range.
    pub fn rewind(&mut self, pos: usize) {
        self.pos = pos.clamp(self.base, self.pos);
    }

    /// Discards everything written, returning the position to `base`.
    pub fn reset(&mut self) {
        self.pos = self.base;
    }
}
