//! Bounded-stack streaming protobuf encoder.
//!
//! This crate ties together the cursor, wire, and schema crates into an
//! encoder that writes nested messages in a single pass without recursion or
//! allocation.
//!
//! # Features
//!
//! - Nested messages on a fixed-depth, array-backed frame stack
//! - Packed repeated fields coalesced into one length-delimited run
//! - Caller-provided, encoder-allocated, and count-only output
//! - Flush sinks for output larger than the buffer
//! - Splicing of already-encoded sub-messages
//!
//! # Design Principles
//!
//! - **Bounded** - Nesting depth is a configured limit, never the call stack.
//! - **No steady-state allocations** - Uses caller-provided buffers.
//! - **Atomic writes** - A failed operation leaves the output unchanged.

mod encoder;
mod error;
mod flush;
mod frame;
mod limits;
mod output;
mod splice;
mod value;

pub use encoder::Encoder;
pub use error::{EncodeError, EncodeResult, RequestError};
pub use flush::{FlushReason, FlushSink};
pub use limits::{EncoderLimits, MAX_CAPACITY, MAX_STACK_DEPTH, NESTED_HEADER_SLOP};
pub use output::{Finished, OutputMode};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = EncoderLimits::default();
        let _ = FlushReason::BufferFull;
        let _ = OutputMode::CountOnly;
        let _: EncodeResult<()> = Ok(());
        assert!(NESTED_HEADER_SLOP >= 10);
        assert_eq!(MAX_STACK_DEPTH, 16);
    }
}
