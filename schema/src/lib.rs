//! Field and message descriptors for the prbuf encoder.
//!
//! This crate defines the schema an encoder validates against:
//! - Value kinds, labels, and option flags for fields
//! - Message definitions addressed by [`MessageId`]
//! - Untyped field descriptors for payloads outside the schema
//! - Deterministic schema hashing
//!
//! # Design Principles
//!
//! - **Runtime-first** - Schemas are built at runtime or loaded from JSON, no code generation.
//! - **Validated once** - A [`Schema`] that exists has passed [`Schema::validate`].
//! - **Deterministic hashing** - Schema hash is stable given the same definition.

mod error;
mod field;
mod hash;
mod schema;

pub use error::{SchemaError, SchemaResult};
pub use field::{FieldDef, FieldDesc, FieldFlags, FieldKind, Label, UntypedField};
pub use hash::schema_hash;
pub use schema::{MessageDef, MessageId, Schema, SchemaBuilder};
