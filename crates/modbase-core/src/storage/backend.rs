//! Storage backend contract.
//!
//! The relational engine itself is an external collaborator: the kernel
//! only requires the create/alter/insert/update/select primitives below,
//! plus a scoped transaction used to make each module's synchronization
//! all-or-nothing.

use crate::catalog::{ColumnSpec, ColumnType};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    Text(String),
    /// Timestamp (microseconds since Unix epoch).
    Timestamp(i64),
}

impl Value {
    /// Short name of the value shape, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check the value fits a column of the given type.
    pub fn matches_column(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (Value::Null, _)
                | (Value::Bool(_), ColumnType::Bool)
                | (Value::Int(_), ColumnType::BigInt)
                | (Value::Float(_), ColumnType::Double)
                | (Value::Text(_), ColumnType::Varchar)
                | (Value::Text(_), ColumnType::Text)
                | (Value::Timestamp(_), ColumnType::Timestamp)
        )
    }
}

/// A row, keyed by column name. The surrogate `id` travels separately.
pub type Row = BTreeMap<String, Value>;

/// Physical description of a table to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name.
    pub name: String,
    /// Name of the surrogate primary key column.
    pub primary_key: String,
    /// Columns, in creation order.
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    /// Create a spec with the conventional `id` primary key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: "id".to_string(),
            columns: Vec::new(),
        }
    }

    /// Add a column.
    pub fn with_column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Actual state of a physical table, as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    /// Table name.
    pub name: String,
    /// Columns currently present.
    pub columns: Vec<ColumnSpec>,
}

impl TableInfo {
    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Relational storage primitives required by the kernel.
///
/// Methods take `&self`; implementations are expected to use interior
/// mutability so the backend can be shared across the kernel components.
pub trait Backend {
    /// Describe a table, or `None` if it does not exist.
    fn table_info(&self, table: &str) -> Result<Option<TableInfo>, Error>;

    /// Create a table.
    fn create_table(&self, spec: &TableSpec) -> Result<(), Error>;

    /// Append a column to an existing table. `backfill`, when given, is
    /// written into the new column of every existing row.
    fn add_column(
        &self,
        table: &str,
        column: &ColumnSpec,
        backfill: Option<&Value>,
    ) -> Result<(), Error>;

    /// Open a scoped transaction.
    fn begin(&self) -> Result<(), Error>;

    /// Commit the open transaction.
    fn commit(&self) -> Result<(), Error>;

    /// Roll back the open transaction.
    fn rollback(&self) -> Result<(), Error>;

    /// Insert a row, returning the assigned surrogate id.
    fn insert(&self, table: &str, row: &Row) -> Result<i64, Error>;

    /// Overwrite the given columns of an existing row.
    fn update(&self, table: &str, id: i64, row: &Row) -> Result<(), Error>;

    /// Fetch a row by surrogate id.
    fn get(&self, table: &str, id: i64) -> Result<Option<Row>, Error>;

    /// Delete a row by surrogate id.
    fn delete(&self, table: &str, id: i64) -> Result<(), Error>;

    /// All rows of a table in id order.
    fn scan(&self, table: &str) -> Result<Vec<(i64, Row)>, Error>;
}
