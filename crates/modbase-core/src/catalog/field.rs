//! Field descriptors for entities.

use super::types::FieldKind;
use crate::storage::Value;
use serde::{Deserialize, Serialize};

/// A declared field within an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name (unique within the entity).
    pub name: String,
    /// Display label.
    pub label: String,
    /// Semantic kind.
    pub kind: FieldKind,
    /// Whether a value must be present on every row.
    pub required: bool,
    /// Default applied when no value is provided.
    pub default: Option<DefaultValue>,
}

/// Default value for a field: a literal or a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// A literal value.
    Literal(Value),
    /// Current timestamp, evaluated when the row is written.
    Now,
}

impl FieldDescriptor {
    /// Create an optional field with the name doubling as label.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
            required: false,
            default: None,
        }
    }

    /// Mark the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set a literal default.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    /// Default to the write-time timestamp.
    pub fn default_now(mut self) -> Self {
        self.default = Some(DefaultValue::Now);
        self
    }

    /// Check if this field has a default.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_builder() {
        let field = FieldDescriptor::new("title", FieldKind::Char)
            .with_label("Title")
            .required();

        assert_eq!(field.name, "title");
        assert_eq!(field.label, "Title");
        assert!(field.required);
        assert!(!field.has_default());
    }

    #[test]
    fn test_field_defaults() {
        let field = FieldDescriptor::new("active", FieldKind::Boolean)
            .with_default(Value::Bool(true));
        assert_eq!(
            field.default,
            Some(DefaultValue::Literal(Value::Bool(true)))
        );

        let stamped = FieldDescriptor::new("checked_at", FieldKind::DateTime).default_now();
        assert_eq!(stamped.default, Some(DefaultValue::Now));
    }
}
