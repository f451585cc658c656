//! Message descriptors and schema validation.

use std::collections::HashSet;
use std::fmt;

use wire::MAX_FIELD_NUMBER;

use crate::error::{SchemaError, SchemaResult};
use crate::field::{FieldDef, FieldKind, Label};

/// Index of a message within its [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct MessageId(u16);

impl MessageId {
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message definition: an ordered set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl MessageDef {
    /// Creates a message with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the message.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Looks up a field by number.
    #[must_use]
    pub fn by_number(&self, number: u32) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.number == number)
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns `true` if `field` is one of this message's fields.
    ///
    /// Membership is by field number and value kind, so a clone of a field
    /// definition is still recognized.
    #[must_use]
    pub fn contains(&self, field: &FieldDef) -> bool {
        self.by_number(field.number)
            .is_some_and(|own| own.kind == field.kind)
    }
}

/// A schema consisting of message definitions addressed by [`MessageId`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    pub messages: Vec<MessageDef>,
}

impl Schema {
    /// Creates a schema from messages after validation.
    pub fn new(messages: Vec<MessageDef>) -> SchemaResult<Self> {
        let schema = Self { messages };
        schema.validate()?;
        Ok(schema)
    }

    /// Creates a schema builder.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            messages: Vec::new(),
        }
    }

    /// Returns the message with the given id.
    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<&MessageDef> {
        self.messages.get(id.index())
    }

    /// Returns the id of the message with the given name.
    #[must_use]
    pub fn message_id(&self, name: &str) -> Option<MessageId> {
        self.messages
            .iter()
            .position(|message| message.name == name)
            .map(|index| MessageId(index as u16))
    }

    /// Looks up `name` in message `id`.
    #[must_use]
    pub fn field(&self, id: MessageId, name: &str) -> Option<&FieldDef> {
        self.message(id).and_then(|message| message.by_name(name))
    }

    /// Validates schema invariants.
    pub fn validate(&self) -> SchemaResult<()> {
        if self.messages.len() > usize::from(u16::MAX) + 1 {
            return Err(SchemaError::TooManyMessages {
                count: self.messages.len(),
            });
        }

        let mut names = HashSet::new();
        for (index, message) in self.messages.iter().enumerate() {
            if !names.insert(message.name.as_str()) {
                return Err(SchemaError::DuplicateMessageName {
                    name: message.name.clone(),
                });
            }

            let id = MessageId(index as u16);
            let mut numbers = HashSet::new();
            for field in &message.fields {
                if !numbers.insert(field.number) {
                    return Err(SchemaError::DuplicateFieldNumber {
                        message: id,
                        number: field.number,
                    });
                }
                self.validate_field(id, field)?;
            }
        }
        Ok(())
    }

    fn validate_field(&self, message: MessageId, field: &FieldDef) -> SchemaResult<()> {
        let number = field.number;
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(SchemaError::InvalidFieldNumber { message, number });
        }

        match (field.kind, field.message) {
            (FieldKind::Message, None) => {
                return Err(SchemaError::MissingMessageType { message, number });
            }
            (FieldKind::Message, Some(target)) => {
                if self.message(target).is_none() {
                    return Err(SchemaError::UnknownMessage {
                        message,
                        number,
                        target,
                    });
                }
            }
            (_, Some(_)) => {
                return Err(SchemaError::UnexpectedMessageType { message, number });
            }
            (_, None) => {}
        }

        if field.flags.is_packed() {
            if field.label != Label::Repeated {
                return Err(SchemaError::PackedNotRepeated { message, number });
            }
            if !field.wire_type().is_packable() {
                return Err(SchemaError::PackedLengthDelimited { message, number });
            }
        }
        Ok(())
    }
}

/// Builder for `Schema`.
///
/// Messages are numbered in insertion order; [`SchemaBuilder::reserve`] hands
/// out an id before the message is defined so messages can refer to each
/// other (or themselves).
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    messages: Vec<Option<MessageDef>>,
}

impl SchemaBuilder {
    /// Adds a message definition and returns its id.
    pub fn add(&mut self, message: MessageDef) -> MessageId {
        let id = MessageId(self.messages.len() as u16);
        self.messages.push(Some(message));
        id
    }

    /// Reserves an id for a message defined later with [`define`](Self::define).
    pub fn reserve(&mut self) -> MessageId {
        let id = MessageId(self.messages.len() as u16);
        self.messages.push(None);
        id
    }

    /// Defines a previously reserved message.
    pub fn define(&mut self, id: MessageId, message: MessageDef) {
        if let Some(slot) = self.messages.get_mut(id.index()) {
            *slot = Some(message);
        }
    }

    /// Builds the schema after validation.
    ///
    /// Reserved ids that were never defined become empty messages named after
    /// their index.
    pub fn build(self) -> SchemaResult<Schema> {
        let messages = self
            .messages
            .into_iter()
            .enumerate()
            .map(|(index, message)| {
                message.unwrap_or_else(|| MessageDef::new(format!("__undefined_{index}")))
            })
            .collect();
        Schema::new(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> MessageDef {
        MessageDef::new("Point")
            .field(FieldDef::new("x", 1, FieldKind::Sint32))
            .field(FieldDef::new("y", 2, FieldKind::Sint32))
    }

    #[test]
    fn schema_builder_roundtrip() {
        let mut builder = Schema::builder();
        let point_id = builder.add(point());
        let root = builder.add(
            MessageDef::new("Shape").field(FieldDef::message("points", 1, point_id).repeated()),
        );
        let schema = builder.build().unwrap();
        assert_eq!(schema.messages.len(), 2);
        assert_eq!(schema.message_id("Shape"), Some(root));
        assert_eq!(schema.field(root, "points").unwrap().message, Some(point_id));
    }

    #[test]
    fn reserve_allows_self_reference() {
        let mut builder = Schema::builder();
        let node = builder.reserve();
        builder.define(
            node,
            MessageDef::new("Node")
                .field(FieldDef::new("value", 1, FieldKind::Uint32))
                .field(FieldDef::message("child", 2, node)),
        );
        let schema = builder.build().unwrap();
        assert_eq!(schema.field(node, "child").unwrap().message, Some(node));
    }

    #[test]
    fn lookups_by_number_and_name() {
        let message = point();
        assert_eq!(message.by_number(2).unwrap().name, "y");
        assert_eq!(message.by_name("x").unwrap().number, 1);
        assert!(message.by_number(3).is_none());
    }

    #[test]
    fn contains_checks_number_and_kind() {
        let message = point();
        assert!(message.contains(&FieldDef::new("x", 1, FieldKind::Sint32)));
        assert!(!message.contains(&FieldDef::new("x", 1, FieldKind::Uint32)));
        assert!(!message.contains(&FieldDef::new("z", 3, FieldKind::Sint32)));
    }

    #[test]
    fn schema_rejects_duplicate_message_names() {
        let err = Schema::new(vec![point(), point()]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateMessageName { .. }));
    }

    #[test]
    fn schema_rejects_duplicate_field_numbers() {
        let message = MessageDef::new("M")
            .field(FieldDef::new("a", 1, FieldKind::Bool))
            .field(FieldDef::new("b", 1, FieldKind::Uint32));
        let err = Schema::new(vec![message]).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::DuplicateFieldNumber { number: 1, .. }
        ));
    }

    #[test]
    fn schema_rejects_invalid_field_numbers() {
        for number in [0, MAX_FIELD_NUMBER + 1] {
            let message = MessageDef::new("M").field(FieldDef::new("a", number, FieldKind::Bool));
            let err = Schema::new(vec![message]).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidFieldNumber { .. }));
        }
    }

    #[test]
    fn schema_rejects_message_field_without_type() {
        let message = MessageDef::new("M").field(FieldDef::new("a", 1, FieldKind::Message));
        let err = Schema::new(vec![message]).unwrap_err();
        assert!(matches!(err, SchemaError::MissingMessageType { .. }));
    }

    #[test]
    fn schema_rejects_scalar_with_message_type() {
        let mut field = FieldDef::new("a", 1, FieldKind::Uint32);
        field.message = Some(MessageId::new(0));
        let err = Schema::new(vec![MessageDef::new("M").field(field)]).unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedMessageType { .. }));
    }

    #[test]
    fn schema_rejects_unknown_message_reference() {
        let message = MessageDef::new("M").field(FieldDef::message("a", 1, MessageId::new(4)));
        let err = Schema::new(vec![message]).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownMessage {
                target: MessageId(4),
                ..
            }
        ));
    }

    #[test]
    fn schema_rejects_packed_strings() {
        let message = MessageDef::new("M").field(FieldDef::new("a", 1, FieldKind::String).packed());
        let err = Schema::new(vec![message]).unwrap_err();
        assert!(matches!(err, SchemaError::PackedLengthDelimited { .. }));
    }

    #[test]
    fn schema_rejects_packed_singular() {
        let mut field = FieldDef::new("a", 1, FieldKind::Uint32).packed();
        field.label = Label::Optional;
        let err = Schema::new(vec![MessageDef::new("M").field(field)]).unwrap_err();
        assert!(matches!(err, SchemaError::PackedNotRepeated { .. }));
    }
}
