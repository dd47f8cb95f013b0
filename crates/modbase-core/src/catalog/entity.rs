//! Entity descriptors.

use super::field::FieldDescriptor;
use super::types::ColumnType;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Names and column types of the five audit columns appended to every
/// entity table. They are stamped by the repository and are never
/// user-declared.
pub const AUDIT_COLUMNS: [(&str, ColumnType); 5] = [
    ("id", ColumnType::BigInt),
    ("create_date", ColumnType::Timestamp),
    ("write_date", ColumnType::Timestamp),
    ("create_uid", ColumnType::BigInt),
    ("write_uid", ColumnType::BigInt),
];

/// A declarative description of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Globally unique logical name, `<namespace>.<identifier>`.
    pub logical_name: String,
    /// Backing table name, derived from the logical name.
    pub table_name: String,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    /// Create a descriptor with no fields. The table name is derived
    /// deterministically from the logical name (dots become underscores).
    pub fn new(logical_name: impl Into<String>) -> Self {
        let logical_name = logical_name.into();
        let table_name = logical_name.replace('.', "_");
        Self {
            logical_name,
            table_name,
            fields: Vec::new(),
        }
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The namespace part of the logical name.
    pub fn namespace(&self) -> &str {
        self.logical_name
            .split_once('.')
            .map(|(ns, _)| ns)
            .unwrap_or("")
    }

    /// Check structural invariants: the logical name follows
    /// `<namespace>.<identifier>`, field names are unique, and no field
    /// shadows an audit column.
    pub fn validate(&self) -> Result<(), Error> {
        let well_formed = match self.logical_name.split_once('.') {
            Some((ns, ident)) => !ns.is_empty() && !ident.is_empty(),
            None => false,
        };
        if !well_formed {
            return Err(Error::InvalidDescriptor {
                logical_name: self.logical_name.clone(),
                reason: "logical name must be '<namespace>.<identifier>'".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidDescriptor {
                    logical_name: self.logical_name.clone(),
                    reason: format!("duplicate field '{}'", field.name),
                });
            }
            if AUDIT_COLUMNS.iter().any(|(name, _)| *name == field.name) {
                return Err(Error::InvalidDescriptor {
                    logical_name: self.logical_name.clone(),
                    reason: format!("field '{}' shadows an audit column", field.name),
                });
            }
        }
        Ok(())
    }
}
