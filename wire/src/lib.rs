//! Tag-length-value wire primitives for the prbuf encoder.
//!
//! This crate knows the binary layout shared by every encoded field: a tag
//! (`(field_number << 3) | wire_type`) followed by a varint, a fixed-width
//! value, or a length-prefixed payload. It does not know about schemas or
//! message nesting.
//!
//! # Design Principles
//!
//! - **Stable wire format** - Compatible with the standard protobuf binary encoding.
//! - **Bounded decoding** - Length prefixes are validated against the input before slicing.
//! - **No domain knowledge** - This crate handles field framing, not message semantics.

mod error;
mod field;
mod tag;

pub use error::{WireError, WireResult};
pub use field::{
    decode_length, decode_tag, delimited_header_len, put_delimited_header, put_tag,
    split_delimited_field, DelimitedField,
};
pub use tag::{
    Tag, WireType, MAX_FIELD_HEADER_LEN, MAX_FIELD_NUMBER, MAX_LENGTH_PREFIX_LEN, MAX_TAG_LEN,
};
