//! Append-only schema synchronization.
//!
//! Reconciles an entity descriptor with the physical table behind it.
//! Synchronization only ever creates tables and appends columns; it
//! never drops, renames or retypes anything, so it is safe to run
//! repeatedly over a live schema.

use crate::catalog::{
    ColumnSpec, DefaultValue, EntityDescriptor, FieldDescriptor, FieldTypeCatalog, AUDIT_COLUMNS,
};
use crate::error::Error;
use crate::storage::{current_timestamp, Backend, TableSpec, Value};
use tracing::{debug, info};

/// Reconciles descriptors with physical tables.
pub struct SchemaSynchronizer<'a> {
    backend: &'a dyn Backend,
    catalog: FieldTypeCatalog,
}

impl<'a> SchemaSynchronizer<'a> {
    /// Create a synchronizer over a backend.
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self {
            backend,
            catalog: FieldTypeCatalog::new(),
        }
    }

    /// Bring the table behind `descriptor` up to the declared schema.
    pub fn synchronize(&self, descriptor: &EntityDescriptor) -> Result<(), Error> {
        let expected = self.expected_columns(descriptor)?;

        match self.backend.table_info(&descriptor.table_name)? {
            None => {
                let mut spec = TableSpec::new(&descriptor.table_name);
                for (column, _) in expected {
                    spec = spec.with_column(column);
                }
                self.backend.create_table(&spec)?;
                info!(table = %descriptor.table_name, "created table");
            }
            Some(info) => {
                for (column, backfill) in expected {
                    match info.get_column(&column.name) {
                        Some(actual) => {
                            if actual.column_type != column.column_type {
                                return Err(Error::SchemaConflict {
                                    table: descriptor.table_name.clone(),
                                    column: column.name.clone(),
                                    actual: actual.column_type.to_string(),
                                    declared: column.column_type.to_string(),
                                });
                            }
                        }
                        None => {
                            self.backend.add_column(
                                &descriptor.table_name,
                                &column,
                                backfill.as_ref(),
                            )?;
                            debug!(
                                table = %descriptor.table_name,
                                column = %column.name,
                                "added column"
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Expected physical columns: the five audit columns followed by the
    /// declared fields, each paired with the backfill value used when the
    /// column has to be appended to a table with existing rows.
    fn expected_columns(
        &self,
        descriptor: &EntityDescriptor,
    ) -> Result<Vec<(ColumnSpec, Option<Value>)>, Error> {
        let mut columns = Vec::with_capacity(AUDIT_COLUMNS.len() + descriptor.fields.len());
        for (name, column_type) in AUDIT_COLUMNS {
            let backfill = match column_type {
                crate::catalog::ColumnType::Timestamp => Value::Timestamp(0),
                _ => Value::Int(0),
            };
            columns.push((
                ColumnSpec::new(name, column_type).not_null(),
                Some(backfill),
            ));
        }
        for field in &descriptor.fields {
            let entry = self.catalog.resolve(&field.kind)?;
            let mut column = ColumnSpec::new(&field.name, entry.column_type);
            if field.required {
                column = column.not_null();
            }
            // Existing rows must stay valid, so required columns carry a
            // resolved default when appended.
            let backfill = if field.required {
                Some(Self::resolved_default(field, &entry.zero))
            } else {
                None
            };
            columns.push((column, backfill));
        }
        Ok(columns)
    }

    fn resolved_default(field: &FieldDescriptor, zero: &Value) -> Value {
        match &field.default {
            Some(DefaultValue::Literal(value)) => value.clone(),
            Some(DefaultValue::Now) => Value::Timestamp(current_timestamp()),
            None => zero.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnType, FieldKind};
    use crate::storage::{MemoryBackend, Row};

    fn book() -> EntityDescriptor {
        EntityDescriptor::new("library.book")
            .with_field(FieldDescriptor::new("title", FieldKind::Char).required())
            .with_field(FieldDescriptor::new("isbn", FieldKind::Char))
            .with_field(FieldDescriptor::new("subject", FieldKind::Char))
            .with_field(FieldDescriptor::new("abstract", FieldKind::Text))
    }

    #[test]
    fn test_creates_table_with_audit_columns() {
        let backend = MemoryBackend::new();
        let sync = SchemaSynchronizer::new(&backend);

        sync.synchronize(&book()).unwrap();

        let info = backend.table_info("library_book").unwrap().unwrap();
        // 4 declared + 5 audit.
        assert_eq!(info.columns.len(), 9);
        for name in ["id", "create_date", "write_date", "create_uid", "write_uid"] {
            assert!(info.get_column(name).is_some(), "missing audit column {name}");
        }
        assert_eq!(
            info.get_column("abstract").unwrap().column_type,
            ColumnType::Text
        );
        assert!(!info.get_column("title").unwrap().nullable);
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let backend = MemoryBackend::new();
        let sync = SchemaSynchronizer::new(&backend);

        sync.synchronize(&book()).unwrap();
        let before = backend.table_info("library_book").unwrap().unwrap();
        sync.synchronize(&book()).unwrap();
        let after = backend.table_info("library_book").unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_adds_missing_column_with_backfill() {
        let backend = MemoryBackend::new();
        let sync = SchemaSynchronizer::new(&backend);
        sync.synchronize(&book()).unwrap();

        let mut row = Row::new();
        row.insert("title".to_string(), Value::Text("Dune".into()));
        let id = backend.insert("library_book", &row).unwrap();

        let grown = book().with_field(
            FieldDescriptor::new("pages", FieldKind::Integer)
                .required()
                .with_default(Value::Int(1)),
        );
        sync.synchronize(&grown).unwrap();

        let info = backend.table_info("library_book").unwrap().unwrap();
        assert_eq!(info.columns.len(), 10);
        let fetched = backend.get("library_book", id).unwrap().unwrap();
        assert_eq!(fetched["pages"], Value::Int(1));
    }

    #[test]
    fn test_optional_column_added_without_backfill() {
        let backend = MemoryBackend::new();
        let sync = SchemaSynchronizer::new(&backend);
        sync.synchronize(&book()).unwrap();

        let mut row = Row::new();
        row.insert("title".to_string(), Value::Text("Dune".into()));
        let id = backend.insert("library_book", &row).unwrap();

        let grown = book().with_field(FieldDescriptor::new("notes", FieldKind::Text));
        sync.synchronize(&grown).unwrap();

        let fetched = backend.get("library_book", id).unwrap().unwrap();
        assert!(!fetched.contains_key("notes"));
    }

    #[test]
    fn test_type_change_is_a_conflict() {
        let backend = MemoryBackend::new();
        let sync = SchemaSynchronizer::new(&backend);
        sync.synchronize(&book()).unwrap();

        let retyped = EntityDescriptor::new("library.book")
            .with_field(FieldDescriptor::new("title", FieldKind::Integer));
        let err = sync.synchronize(&retyped).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaConflict { column, .. } if column == "title"
        ));
    }

    #[test]
    fn test_never_drops_columns() {
        let backend = MemoryBackend::new();
        let sync = SchemaSynchronizer::new(&backend);
        sync.synchronize(&book()).unwrap();

        // A descriptor that no longer declares 'isbn' leaves the column alone.
        let shrunk = EntityDescriptor::new("library.book")
            .with_field(FieldDescriptor::new("title", FieldKind::Char).required());
        sync.synchronize(&shrunk).unwrap();

        let info = backend.table_info("library_book").unwrap().unwrap();
        assert!(info.get_column("isbn").is_some());
    }
}
