//! Output buffer policies.

/// Where encoded bytes land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Caller-provided buffer.
    Fixed,
    /// Buffer allocated and owned by the encoder.
    Heap,
    /// Nothing is stored; only sizes accumulate.
    CountOnly,
    /// The allocated buffer was released; the encoder is disabled.
    Released,
}

#[derive(Debug)]
pub(crate) enum Output<'b> {
    Fixed(&'b mut [u8]),
    Heap(Vec<u8>),
    Count,
    Released,
}

impl Output<'_> {
    pub(crate) const fn mode(&self) -> OutputMode {
        match self {
            Self::Fixed(_) => OutputMode::Fixed,
            Self::Heap(_) => OutputMode::Heap,
            Self::Count => OutputMode::CountOnly,
            Self::Released => OutputMode::Released,
        }
    }

    pub(crate) const fn is_count_only(&self) -> bool {
        matches!(self, Self::Count)
    }

    /// Returns the byte storage; empty when nothing is stored.
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Fixed(buf) => &mut buf[..],
            Self::Heap(buf) => &mut buf[..],
            Self::Count | Self::Released => Default::default(),
        }
    }
}

/// The result of [`Encoder::finish`](crate::Encoder::finish).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    /// Bytes held in the output buffer (or counted, in count-only mode).
    pub len: usize,
    /// Bytes already handed to the flush sink because the buffer filled.
    pub flushed: usize,
    /// The encoded bytes, for encoders that allocated their own buffer.
    pub buffer: Option<Vec<u8>>,
}

impl Finished {
    /// Total encoded size, including bytes flushed before finish.
    #[must_use]
    pub const fn total_len(&self) -> usize {
        self.len + self.flushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_output_has_no_storage() {
        let mut output = Output::Count;
        assert!(output.bytes_mut().is_empty());
        assert!(output.is_count_only());
        assert_eq!(output.mode(), OutputMode::CountOnly);
    }

    #[test]
    fn fixed_output_exposes_buffer() {
        let mut buf = [0u8; 4];
        let mut output = Output::Fixed(&mut buf);
        output.bytes_mut()[1] = 7;
        assert_eq!(output.mode(), OutputMode::Fixed);
        assert_eq!(buf[1], 7);
    }

    #[test]
    fn total_len_includes_flushed() {
        let finished = Finished {
            len: 3,
            flushed: 10,
            buffer: None,
        };
        assert_eq!(finished.total_len(), 13);
    }
}
