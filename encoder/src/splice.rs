//! Splicing already-encoded fields into the active message.

use wire::{decode_length, decode_tag, WireType};

use crate::encoder::Encoder;
use crate::error::{EncodeError, EncodeResult, RequestError};
use crate::value::WireValue;

impl Encoder<'_, '_> {
    /// Appends one encoded length-delimited field to the active message
    /// without re-encoding its payload.
    ///
    /// The field number must belong to the active message and name a
    /// length-delimited field. Bytes after the first field are ignored.
    pub fn concat_encoded_message(&mut self, bytes: &[u8]) -> EncodeResult<()> {
        self.ensure_active()?;

        let (tag, tag_len) = decode_tag(bytes)?;
        let number = tag.number();
        if tag.wire_type() != WireType::LengthDelimited {
            tracing::warn!(
                field = number,
                wire_type = %tag.wire_type(),
                "splice of a field that is not length-delimited"
            );
            return Err(RequestError::UnexpectedWireType {
                expected: WireType::LengthDelimited,
                found: tag.wire_type(),
            }
            .into());
        }

        let message = self
            .top()
            .message
            .ok_or(RequestError::NoMessageContext { number })?;
        let Some(field) = message.by_number(number) else {
            tracing::warn!(field = number, message = %message.name, "splice of an unknown field");
            return Err(RequestError::UnknownField { number }.into());
        };
        if field.wire_type() != WireType::LengthDelimited {
            return Err(RequestError::UnexpectedWireType {
                expected: field.wire_type(),
                found: WireType::LengthDelimited,
            }
            .into());
        }

        let rest = bytes.get(tag_len..).unwrap_or_default();
        if rest.is_empty() {
            return Err(EncodeError::BufferTooSmall {
                needed: 1,
                available: 0,
            });
        }
        let (len, len_len) = decode_length(rest)?;
        let payload = rest
            .get(len_len..len_len + len)
            .ok_or(EncodeError::BufferTooSmall {
                needed: len,
                available: rest.len() - len_len,
            })?;

        self.close_packed_run()?;
        self.emit_field(|enc| enc.write_top(Some(number), WireValue::Delimited(payload)))
    }

    /// Appends already-encoded field bytes (tags included) to the active
    /// frame as they are.
    pub fn append_encoded(&mut self, bytes: &[u8]) -> EncodeResult<()> {
        self.ensure_active()?;
        self.close_packed_run()?;
        self.emit_field(|enc| enc.write_raw(bytes))
    }
}
