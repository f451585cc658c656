//! Limits for encoder nesting and write policy.

/// Number of frames in the array-backed encoder stack.
pub const MAX_STACK_DEPTH: usize = 16;

/// Bytes reserved in the parent before a nested frame: a worst-case tag (5)
/// plus a worst-case length prefix (5).
pub const NESTED_HEADER_SLOP: usize = wire::MAX_FIELD_HEADER_LEN;

/// Largest output an encoder will address. Length prefixes are at most
/// [`wire::MAX_LENGTH_PREFIX_LEN`] bytes, which only covers `u32` lengths.
pub const MAX_CAPACITY: usize = u32::MAX as usize;

/// Encoder-specific limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderLimits {
    /// Maximum number of open frames, counting the root and any packed run.
    /// Clamped to `1..=MAX_STACK_DEPTH`.
    pub max_depth: u8,
    /// Permit writes to deprecated fields.
    pub allow_deprecated: bool,
}

impl Default for EncoderLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            allow_deprecated: false,
        }
    }
}

impl EncoderLimits {
    /// Creates limits suitable for testing with a shallower stack.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_depth: 4,
            allow_deprecated: false,
        }
    }

    /// Creates limits with the given depth and deprecated writes disallowed.
    #[must_use]
    pub const fn with_max_depth(max_depth: u8) -> Self {
        Self {
            max_depth,
            allow_deprecated: false,
        }
    }

    /// Returns these limits with deprecated writes allowed.
    #[must_use]
    pub const fn allowing_deprecated(mut self) -> Self {
        self.allow_deprecated = true;
        self
    }

    /// Returns `max_depth` clamped to what the frame stack can hold.
    #[must_use]
    pub const fn depth_limit(&self) -> u8 {
        if self.max_depth == 0 {
            1
        } else if self.max_depth as usize > MAX_STACK_DEPTH {
            MAX_STACK_DEPTH as u8
        } else {
            self.max_depth
        }
    }
}
