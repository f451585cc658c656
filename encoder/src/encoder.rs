//! The encoder stack engine.

use std::fmt;

use cursor::{put_slice, ByteCursor};
use schema::{FieldDesc, FieldKind, MessageDef, MessageId, Schema};
use wire::{put_delimited_header, Tag, WireType};

use crate::error::{EncodeError, EncodeResult, RequestError};
use crate::flush::{FlushReason, FlushSink};
use crate::frame::{Frame, FrameKind};
use crate::limits::{EncoderLimits, MAX_CAPACITY, MAX_STACK_DEPTH, NESTED_HEADER_SLOP};
use crate::output::{Finished, Output, OutputMode};
use crate::value::{put_value, Value, WireValue};

/// A streaming encoder over a bounded stack of frames.
///
/// Nested messages are written in place: opening one reserves
/// [`NESTED_HEADER_SLOP`] bytes in the parent, the child's payload is written
/// after that gap, and closing it writes the tag and length into the gap and
/// shifts the payload down to meet them.
///
/// Every operation either completes or leaves the output as it was before the
/// call, so callers may recover from `BufferTooSmall` with
/// [`unwind_to`](Self::unwind_to) and still produce well-formed output.
pub struct Encoder<'s, 'b> {
    schema: &'s Schema,
    output: Output<'b>,
    frames: [Frame<'s>; MAX_STACK_DEPTH],
    depth: u8,
    limits: EncoderLimits,
    disabled: bool,
    flush: Option<&'b mut dyn FlushSink>,
    flushed: usize,
}

impl<'s, 'b> Encoder<'s, 'b> {
    /// Starts encoding message `root` into a caller-provided buffer.
    ///
    /// Only the first [`MAX_CAPACITY`] bytes of `buf` are used.
    pub fn start(schema: &'s Schema, root: MessageId, buf: &'b mut [u8]) -> EncodeResult<Self> {
        let cursor = ByteCursor::with_len(buf.len().min(MAX_CAPACITY));
        Self::with_output(schema, root, Output::Fixed(buf), cursor)
    }

    /// Starts encoding into a buffer of `capacity` bytes owned by the encoder.
    ///
    /// The buffer is returned by [`finish`](Self::finish). Allocation failure
    /// is reported as `NoMemory` instead of producing a disabled encoder.
    pub fn start_allocating(
        schema: &'s Schema,
        root: MessageId,
        capacity: usize,
    ) -> EncodeResult<Self> {
        let mut buf = Vec::new();
        if capacity > MAX_CAPACITY || buf.try_reserve_exact(capacity).is_err() {
            tracing::warn!(capacity, "output buffer allocation failed");
            return Err(EncodeError::NoMemory {
                requested: capacity,
            });
        }
        buf.resize(capacity, 0);
        Self::with_output(
            schema,
            root,
            Output::Heap(buf),
            ByteCursor::with_len(capacity),
        )
    }

    /// Starts a count-only pass: nothing is stored, but every write is
    /// checked against `ceiling` exactly as a real encode would check its
    /// buffer. The ceiling is capped at [`MAX_CAPACITY`].
    pub fn start_counting(schema: &'s Schema, root: MessageId, ceiling: usize) -> EncodeResult<Self> {
        let cursor = ByteCursor::with_len(ceiling.min(MAX_CAPACITY));
        Self::with_output(schema, root, Output::Count, cursor)
    }

    fn with_output(
        schema: &'s Schema,
        root: MessageId,
        output: Output<'b>,
        cursor: ByteCursor,
    ) -> EncodeResult<Self> {
        let message = schema
            .message(root)
            .ok_or(EncodeError::InvalidRequest(RequestError::UnknownMessage))?;

        let mut frames = [Frame::EMPTY; MAX_STACK_DEPTH];
        frames[0] = Frame::root(cursor, message);

        tracing::debug!(
            mode = ?output.mode(),
            capacity = cursor.remaining(),
            root = %message.name,
            "encoder started"
        );

        Ok(Self {
            schema,
            output,
            frames,
            depth: 1,
            limits: EncoderLimits::default(),
            disabled: false,
            flush: None,
            flushed: 0,
        })
    }

    /// Replaces the encoder limits.
    #[must_use]
    pub fn with_limits(mut self, limits: EncoderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Installs a flush sink.
    ///
    /// When a write into the root frame does not fit, everything buffered is
    /// handed to the sink, the buffer is reset, and the write is retried
    /// once. After each completed top-level field the sink also sees that
    /// field's bytes. Sinks are not called in count-only mode.
    #[must_use]
    pub fn with_flush(mut self, sink: &'b mut dyn FlushSink) -> Self {
        self.flush = Some(sink);
        self
    }

    /// Finishes encoding, closing any frames still open.
    pub fn finish(mut self) -> EncodeResult<Finished> {
        self.unwind_to(1)?;
        let len = self.frames[0].cursor.used();
        let flushed = self.flushed;
        let buffer = match self.output {
            Output::Heap(mut buf) => {
                buf.truncate(len);
                Some(buf)
            }
            Output::Fixed(_) | Output::Count | Output::Released => None,
        };
        tracing::debug!(bytes = len, flushed, "encoder finished");
        Ok(Finished {
            len,
            flushed,
            buffer,
        })
    }

    /// Releases an encoder-owned buffer and disables the encoder.
    ///
    /// Every later operation fails with `InvalidRequest(Disabled)`.
    pub fn free_allocated_buffer(&mut self) {
        if matches!(self.output, Output::Heap(_)) {
            self.output = Output::Released;
        }
        self.disabled = true;
        tracing::debug!("encoder released");
    }

    /// Opens a nested message for `field`.
    pub fn nested_start(&mut self, field: impl Into<FieldDesc<'s>>) -> EncodeResult<()> {
        let field = field.into();
        self.ensure_active()?;
        if field.kind() != FieldKind::Message {
            tracing::warn!(
                field = field.number(),
                kind = %field.kind(),
                "nested start on a non-message field"
            );
            return Err(RequestError::NotAMessage {
                number: field.number(),
                kind: field.kind(),
            }
            .into());
        }
        self.check_member(field)?;
        self.check_deprecated(field);
        Tag::new(field.number(), WireType::LengthDelimited)?;
        self.close_packed_run()?;
        self.retry_when_full(|enc| enc.push_frame(field, FrameKind::Message))?;
        Ok(())
    }

    /// Closes the innermost nested message, writing its tag and length into
    /// the parent.
    pub fn nested_end(&mut self) -> EncodeResult<()> {
        self.ensure_active()?;
        self.close_packed_run()?;
        if self.depth <= 1 {
            tracing::warn!("nested end with only the root message open");
            return Err(RequestError::CannotCloseRoot.into());
        }
        self.fold_top()
    }

    /// Runs `body` inside a nested message for `field`.
    ///
    /// The frames opened are closed even when `body` fails; the first error
    /// is returned.
    pub fn nested<F>(&mut self, field: impl Into<FieldDesc<'s>>, body: F) -> EncodeResult<()>
    where
        F: FnOnce(&mut Self) -> EncodeResult<()>,
    {
        self.ensure_active()?;
        self.close_packed_run()?;
        let depth = self.depth;
        self.nested_start(field)?;
        let result = body(self);
        let unwind = self.unwind_to(depth);
        result.and(unwind)
    }

    /// Closes frames until `target` remain open.
    ///
    /// Every frame above `target` is closed even if one of them fails; the
    /// first error is returned. A target at or above the current depth is a
    /// no-op.
    pub fn unwind_to(&mut self, target: u8) -> EncodeResult<()> {
        self.ensure_active()?;
        if target == 0 {
            return Err(RequestError::InvalidDepth { target }.into());
        }
        let mut first = Ok(());
        while self.depth > target {
            let result = self.fold_top();
            if first.is_ok() {
                first = result;
            }
        }
        first
    }

    pub fn add_int32(&mut self, field: impl Into<FieldDesc<'s>>, value: i32) -> EncodeResult<()> {
        self.add(field.into(), Value::I32(value))
    }

    pub fn add_uint32(&mut self, field: impl Into<FieldDesc<'s>>, value: u32) -> EncodeResult<()> {
        self.add(field.into(), Value::U32(value))
    }

    pub fn add_int64(&mut self, field: impl Into<FieldDesc<'s>>, value: i64) -> EncodeResult<()> {
        self.add(field.into(), Value::I64(value))
    }

    pub fn add_uint64(&mut self, field: impl Into<FieldDesc<'s>>, value: u64) -> EncodeResult<()> {
        self.add(field.into(), Value::U64(value))
    }

    pub fn add_bool(&mut self, field: impl Into<FieldDesc<'s>>, value: bool) -> EncodeResult<()> {
        self.add(field.into(), Value::Bool(value))
    }

    pub fn add_enum(&mut self, field: impl Into<FieldDesc<'s>>, value: i32) -> EncodeResult<()> {
        self.add(field.into(), Value::Enum(value))
    }

    pub fn add_float(&mut self, field: impl Into<FieldDesc<'s>>, value: f32) -> EncodeResult<()> {
        self.add(field.into(), Value::F32(value))
    }

    pub fn add_double(&mut self, field: impl Into<FieldDesc<'s>>, value: f64) -> EncodeResult<()> {
        self.add(field.into(), Value::F64(value))
    }

    pub fn add_string(&mut self, field: impl Into<FieldDesc<'s>>, value: &str) -> EncodeResult<()> {
        self.add(field.into(), Value::Str(value))
    }

    /// Adds a `bytes` field, or a `message` field whose payload is already
    /// encoded.
    pub fn add_bytes(&mut self, field: impl Into<FieldDesc<'s>>, value: &[u8]) -> EncodeResult<()> {
        self.add(field.into(), Value::Bytes(value))
    }

    /// Bytes left in the innermost frame.
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        if self.disabled {
            return 0;
        }
        self.top().cursor.remaining()
    }

    /// Number of open frames: 1 for the root, plus one per nested message
    /// or open packed run.
    #[must_use]
    pub const fn current_depth(&self) -> u8 {
        self.depth
    }

    #[must_use]
    pub const fn limits(&self) -> EncoderLimits {
        self.limits
    }

    #[must_use]
    pub const fn output_mode(&self) -> OutputMode {
        self.output.mode()
    }

    #[must_use]
    pub const fn is_count_only(&self) -> bool {
        self.output.is_count_only()
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns `true` if the innermost frame is a packed run.
    #[must_use]
    pub fn in_packed_run(&self) -> bool {
        self.depth > 1 && self.top().kind == FrameKind::PackedRun
    }

    /// Bytes handed to the flush sink because the root buffer filled.
    #[must_use]
    pub const fn flushed_bytes(&self) -> usize {
        self.flushed
    }

    fn add(&mut self, field: FieldDesc<'s>, value: Value<'_>) -> EncodeResult<()> {
        self.ensure_active()?;
        self.check_member(field)?;
        let value = value.lower(field.number(), field.kind())?;
        self.check_deprecated(field);

        if field.is_packed() {
            return self.add_packed(field, value);
        }
        self.close_packed_run()?;
        let number = field.number();
        self.emit_field(|enc| enc.write_top(Some(number), value))
    }

    fn add_packed(&mut self, field: FieldDesc<'s>, value: WireValue<'_>) -> EncodeResult<()> {
        let number = field.number();
        if !value.wire_type().is_packable() {
            return Err(RequestError::PackedLengthDelimited { number }.into());
        }
        if self.in_packed_run() && self.top().number() == number {
            return self.write_top(None, value);
        }
        Tag::new(number, WireType::LengthDelimited)?;
        self.close_packed_run()?;
        self.retry_when_full(|enc| enc.open_run(field, value))?;
        Ok(())
    }

    fn open_run(&mut self, field: FieldDesc<'s>, value: WireValue<'_>) -> EncodeResult<()> {
        self.push_frame(field, FrameKind::PackedRun)?;
        if let Err(err) = self.write_top(None, value) {
            self.depth -= 1;
            return Err(err);
        }
        tracing::trace!(field = field.number(), depth = self.depth, "packed run opened");
        Ok(())
    }

    pub(crate) fn close_packed_run(&mut self) -> EncodeResult<()> {
        if self.in_packed_run() {
            self.fold_top()
        } else {
            Ok(())
        }
    }

    fn push_frame(&mut self, field: FieldDesc<'s>, kind: FrameKind) -> EncodeResult<()> {
        // The header is only written when the frame closes; a bad number must
        // fail here, before the frame exists.
        Tag::new(field.number(), WireType::LengthDelimited)?;

        let depth = self.depth;
        let max_depth = self.limits.depth_limit();
        if depth >= max_depth {
            tracing::warn!(depth, max_depth, field = field.number(), "nesting limit reached");
            return Err(EncodeError::InsufficientResources { depth, max_depth });
        }

        let parent = self.frames[usize::from(depth) - 1];
        let message = match kind {
            FrameKind::PackedRun => parent.message,
            FrameKind::Root | FrameKind::Message => self.nested_message(field)?,
        };
        let cursor = parent.cursor.split_tail(NESTED_HEADER_SLOP)?;

        self.frames[usize::from(depth)] = Frame {
            cursor,
            field: Some(field),
            message,
            kind,
        };
        self.depth = depth + 1;
        Ok(())
    }

    /// Pops the innermost frame and writes it into its parent as a
    /// length-delimited field. Empty packed runs are dropped.
    fn fold_top(&mut self) -> EncodeResult<()> {
        let index = usize::from(self.depth) - 1;
        let Some(parent_index) = index.checked_sub(1) else {
            return Err(RequestError::CannotCloseRoot.into());
        };
        let child = self.frames[index];
        self.depth -= 1;

        let len = child.cursor.used();
        if child.kind == FrameKind::PackedRun {
            tracing::trace!(field = child.number(), bytes = len, "packed run closed");
            if len == 0 {
                return Ok(());
            }
        }

        let count_only = self.output.is_count_only();
        let out = self.output.bytes_mut();
        let parent = &mut self.frames[parent_index].cursor;
        let start = parent.position();
        put_delimited_header(out, parent, child.number(), len, count_only)?;
        if !count_only {
            // The header is never longer than the slop, so the payload only
            // moves towards the front; the ranges may overlap.
            out.copy_within(child.cursor.written(), parent.position());
        }
        parent.advance(len)?;

        if self.depth == 1 {
            self.notify_boundary(start)?;
        }
        Ok(())
    }

    fn nested_message(&self, field: FieldDesc<'s>) -> EncodeResult<Option<&'s MessageDef>> {
        let schema = self.schema;
        match field {
            FieldDesc::Typed(def) => def
                .message
                .and_then(|id| schema.message(id))
                .map(Some)
                .ok_or(EncodeError::InvalidRequest(RequestError::UnknownMessage)),
            FieldDesc::Untyped(_) => Ok(None),
        }
    }

    pub(crate) fn ensure_active(&self) -> EncodeResult<()> {
        if self.disabled {
            return Err(RequestError::Disabled.into());
        }
        Ok(())
    }

    fn check_member(&self, field: FieldDesc<'s>) -> EncodeResult<()> {
        let FieldDesc::Typed(def) = field else {
            return Ok(());
        };
        let message = self
            .top()
            .message
            .ok_or(RequestError::NoMessageContext { number: def.number })?;
        if !message.contains(def) {
            tracing::warn!(
                field = def.number,
                message = %message.name,
                "field does not belong to the active message"
            );
            return Err(RequestError::NotInMessage { number: def.number }.into());
        }
        Ok(())
    }

    fn check_deprecated(&self, field: FieldDesc<'s>) {
        debug_assert!(
            self.limits.allow_deprecated || !field.is_deprecated(),
            "write to deprecated field {}",
            field.number()
        );
    }

    pub(crate) fn top(&self) -> &Frame<'s> {
        &self.frames[self.top_index()]
    }

    const fn top_index(&self) -> usize {
        self.depth.saturating_sub(1) as usize
    }

    /// Writes `value` into the innermost frame, tagged with `number` if
    /// given. Nothing is written on failure.
    pub(crate) fn write_top(&mut self, number: Option<u32>, value: WireValue<'_>) -> EncodeResult<()> {
        let count_only = self.output.is_count_only();
        let index = self.top_index();
        let out = self.output.bytes_mut();
        let cursor = &mut self.frames[index].cursor;
        let checkpoint = cursor.position();
        let result = put_value(out, cursor, number, value, count_only);
        if result.is_err() {
            cursor.rewind(checkpoint);
        }
        result
    }

    /// Writes already-encoded bytes into the innermost frame.
    pub(crate) fn write_raw(&mut self, bytes: &[u8]) -> EncodeResult<()> {
        let count_only = self.output.is_count_only();
        let index = self.top_index();
        let out = self.output.bytes_mut();
        put_slice(out, &mut self.frames[index].cursor, bytes, count_only)?;
        Ok(())
    }

    /// Runs a write that completes a field, with flush handling.
    pub(crate) fn emit_field(
        &mut self,
        op: impl FnMut(&mut Self) -> EncodeResult<()>,
    ) -> EncodeResult<()> {
        let at_root = self.depth == 1;
        let start = self.retry_when_full(op)?;
        if at_root {
            self.notify_boundary(start)?;
        }
        Ok(())
    }

    /// Runs `op`; if it ran out of room in the root frame and a sink is
    /// installed, flushes the root and runs it once more.
    ///
    /// Returns the root position the successful attempt started from.
    fn retry_when_full(
        &mut self,
        mut op: impl FnMut(&mut Self) -> EncodeResult<()>,
    ) -> EncodeResult<usize> {
        let start = self.frames[0].cursor.position();
        match op(self) {
            Ok(()) => Ok(start),
            Err(EncodeError::BufferTooSmall { .. }) if self.can_flush_full() => {
                self.flush_full()?;
                let start = self.frames[0].cursor.position();
                op(self)?;
                Ok(start)
            }
            Err(err) => Err(err),
        }
    }

    fn can_flush_full(&self) -> bool {
        self.depth == 1
            && self.flush.is_some()
            && !self.output.is_count_only()
            && self.frames[0].cursor.used() > 0
    }

    fn flush_full(&mut self) -> EncodeResult<()> {
        let Some(sink) = self.flush.as_deref_mut() else {
            return Ok(());
        };
        let written = self.frames[0].cursor.written();
        let len = written.len();
        let bytes = self.output.bytes_mut().get(written).unwrap_or_default();
        tracing::trace!(bytes = len, "root buffer full, flushing");
        let result = sink.flush(bytes, FlushReason::BufferFull);
        self.abort_on_error(result)?;
        self.frames[0].cursor.reset();
        self.flushed += len;
        Ok(())
    }

    fn notify_boundary(&mut self, start: usize) -> EncodeResult<()> {
        if self.output.is_count_only() {
            return Ok(());
        }
        let Some(sink) = self.flush.as_deref_mut() else {
            return Ok(());
        };
        let end = self.frames[0].cursor.position();
        let bytes = self.output.bytes_mut().get(start..end).unwrap_or_default();
        tracing::trace!(bytes = bytes.len(), "field boundary");
        let result = sink.flush(bytes, FlushReason::FieldBoundary);
        self.abort_on_error(result)
    }

    fn abort_on_error(&mut self, result: EncodeResult<()>) -> EncodeResult<()> {
        if let Err(err) = &result {
            tracing::warn!(error = %err, "flush sink aborted the encode");
            self.disabled = true;
        }
        result
    }
}

impl fmt::Debug for Encoder<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("mode", &self.output.mode())
            .field("depth", &self.depth)
            .field("limits", &self.limits)
            .field("disabled", &self.disabled)
            .field("flushed", &self.flushed)
            .finish_non_exhaustive()
    }
}
