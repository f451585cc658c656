//! Flush callbacks for bounded-memory encoding.

use crate::error::EncodeResult;

/// Why a flush sink was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// The root buffer is full. The sink receives everything buffered so far;
    /// on success the buffer is reset and the failed write retried once.
    BufferFull,
    /// A top-level field was completed. The sink receives that field's bytes,
    /// which stay in the buffer.
    FieldBoundary,
}

/// Receives encoded bytes while an encode is in progress.
///
/// Returning an error aborts the encode: the encoder is disabled and the
/// error is returned from the operation that triggered the flush.
pub trait FlushSink {
    fn flush(&mut self, bytes: &[u8], reason: FlushReason) -> EncodeResult<()>;
}

impl<F> FlushSink for F
where
    F: FnMut(&[u8], FlushReason) -> EncodeResult<()>,
{
    fn flush(&mut self, bytes: &[u8], reason: FlushReason) -> EncodeResult<()> {
        self(bytes, reason)
    }
}
