//! Core type definitions for the catalog.

use crate::error::Error;
use crate::storage::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic field kinds supported by the kernel.
///
/// The set is closed: metadata kind tags outside it are rejected at
/// declaration time rather than mapped to an open-ended type hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Short text (single line).
    Char,
    /// Long text (multi-line).
    Text,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// Boolean value.
    Boolean,
    /// Timestamp (microseconds since Unix epoch).
    DateTime,
    /// Reference to another entity's surrogate key.
    Reference {
        /// Logical name of the referenced entity.
        target: String,
    },
}

/// Storage column kinds a field kind can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Bounded UTF-8 string.
    Varchar,
    /// Unbounded UTF-8 string.
    Text,
    /// 64-bit signed integer.
    BigInt,
    /// 64-bit floating point.
    Double,
    /// Boolean.
    Bool,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::Varchar => "varchar",
            ColumnType::Text => "text",
            ColumnType::BigInt => "bigint",
            ColumnType::Double => "double",
            ColumnType::Bool => "bool",
            ColumnType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A physical column derived from a field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Storage type.
    pub column_type: ColumnType,
    /// Whether NULL is accepted.
    pub nullable: bool,
}

impl ColumnSpec {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Resolution entry for one field kind.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    /// Column type the kind maps to.
    pub column_type: ColumnType,
    /// Neutral value used to backfill required columns on existing rows.
    pub zero: Value,
}

/// Dispatch table mapping field kinds to storage behavior.
///
/// Pure lookup: the table is populated once at construction and never
/// mutated afterwards.
#[derive(Debug)]
pub struct FieldTypeCatalog {
    entries: HashMap<&'static str, TypeEntry>,
}

impl FieldTypeCatalog {
    /// Build the full dispatch table.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            "char",
            TypeEntry {
                column_type: ColumnType::Varchar,
                zero: Value::Text(String::new()),
            },
        );
        entries.insert(
            "text",
            TypeEntry {
                column_type: ColumnType::Text,
                zero: Value::Text(String::new()),
            },
        );
        entries.insert(
            "integer",
            TypeEntry {
                column_type: ColumnType::BigInt,
                zero: Value::Int(0),
            },
        );
        entries.insert(
            "float",
            TypeEntry {
                column_type: ColumnType::Double,
                zero: Value::Float(0.0),
            },
        );
        entries.insert(
            "boolean",
            TypeEntry {
                column_type: ColumnType::Bool,
                zero: Value::Bool(false),
            },
        );
        entries.insert(
            "datetime",
            TypeEntry {
                column_type: ColumnType::Timestamp,
                zero: Value::Timestamp(0),
            },
        );
        entries.insert(
            "reference",
            TypeEntry {
                column_type: ColumnType::BigInt,
                zero: Value::Null,
            },
        );
        Self { entries }
    }

    /// Resolve a field kind to its storage behavior.
    pub fn resolve(&self, kind: &FieldKind) -> Result<&TypeEntry, Error> {
        self.entries
            .get(kind.tag())
            .ok_or_else(|| Error::UnsupportedFieldType {
                kind: kind.tag().to_string(),
            })
    }
}

impl Default for FieldTypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldKind {
    /// The metadata tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::Char => "char",
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "datetime",
            FieldKind::Reference { .. } => "reference",
        }
    }

    /// Parse a scalar kind tag.
    ///
    /// `reference` carries a target entity and is built by the metadata
    /// layer from its own attribute; it is rejected here.
    pub fn from_tag(tag: &str) -> Result<Self, Error> {
        match tag {
            "char" => Ok(FieldKind::Char),
            "text" => Ok(FieldKind::Text),
            "integer" => Ok(FieldKind::Integer),
            "float" => Ok(FieldKind::Float),
            "boolean" => Ok(FieldKind::Boolean),
            "datetime" => Ok(FieldKind::DateTime),
            other => Err(Error::UnsupportedFieldType {
                kind: other.to_string(),
            }),
        }
    }

    /// Create a reference kind.
    pub fn reference(target: impl Into<String>) -> Self {
        FieldKind::Reference {
            target: target.into(),
        }
    }
}
