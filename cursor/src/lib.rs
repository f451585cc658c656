//! Byte cursor and primitive codecs for the prbuf encoder.
//!
//! This crate provides [`ByteCursor`], a bounds-tracked write position over a
//! byte range, and the primitive codecs every encoder path is built from:
//! base-128 varints, zig-zag mapping, and little-endian fixed-width integers.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - Every write is checked against the cursor's end.
//! - **No allocation** - Cursors are plain offsets; the caller owns the bytes.
//! - **Count-only capable** - Every writer can advance without storing bytes.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use cursor::{decode_varint, put_varint, ByteCursor};
//!
//! let mut buf = [0u8; 4];
//! let mut cursor = ByteCursor::with_len(buf.len());
//! put_varint(&mut buf, &mut cursor, 300, false).unwrap();
//!
//! assert_eq!(&buf[..cursor.used()], &[0xAC, 0x02]);
//! assert_eq!(decode_varint(&buf).unwrap(), (300, 2));
//! ```

mod cursor;
mod error;
mod varint;

pub use crate::cursor::ByteCursor;
pub use error::{CursorError, CursorResult};
pub use varint::{
    decode_varint, encode_varint, put_fixed32, put_fixed64, put_slice, put_varint, varint_len,
    zigzag32, zigzag64, MAX_VARINT_LEN,
};
