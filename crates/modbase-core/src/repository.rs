//! Row-level data access.
//!
//! Explicit mapper between records and table rows. Synchronization with
//! storage happens only through [`Repository::load`],
//! [`Repository::save`] and [`Repository::delete`]; there is no implicit
//! attribute interception. The repository stamps the audit columns on
//! every write.

use crate::catalog::{DefaultValue, EntityDescriptor, FieldTypeCatalog};
use crate::error::Error;
use crate::storage::{current_timestamp, Backend, Row, Value};

/// An in-memory record of one entity row.
///
/// `values` holds declared fields only; the surrogate id and audit
/// columns are managed by the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Surrogate id; `None` until the record is first saved.
    pub id: Option<i64>,
    /// Declared field values.
    pub values: Row,
}

impl Record {
    /// Create an unsaved record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value.
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}

/// Data access for one entity.
pub struct Repository<'a> {
    descriptor: EntityDescriptor,
    backend: &'a dyn Backend,
    catalog: FieldTypeCatalog,
    /// User stamped into `create_uid`/`write_uid`.
    uid: i64,
}

impl<'a> Repository<'a> {
    /// Create a repository for `descriptor`, writing as user `uid`.
    pub fn new(descriptor: EntityDescriptor, backend: &'a dyn Backend, uid: i64) -> Self {
        Self {
            descriptor,
            backend,
            catalog: FieldTypeCatalog::new(),
            uid,
        }
    }

    /// The descriptor this repository maps.
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// Load a record by id. Audit columns are stripped from the result.
    pub fn load(&self, id: i64) -> Result<Option<Record>, Error> {
        let row = self.backend.get(&self.descriptor.table_name, id)?;
        Ok(row.map(|row| {
            let values = row
                .into_iter()
                .filter(|(name, _)| self.descriptor.get_field(name).is_some())
                .collect();
            Record {
                id: Some(id),
                values,
            }
        }))
    }

    /// Persist a record: insert when it has no id yet, update otherwise.
    /// Returns the surrogate id and writes it back into the record.
    pub fn save(&self, record: &mut Record) -> Result<i64, Error> {
        self.validate(record)?;

        let now = current_timestamp();
        let mut row = record.values.clone();

        match record.id {
            None => {
                self.apply_defaults(&mut row, now);
                self.check_required(&row)?;
                row.insert("create_date".to_string(), Value::Timestamp(now));
                row.insert("write_date".to_string(), Value::Timestamp(now));
                row.insert("create_uid".to_string(), Value::Int(self.uid));
                row.insert("write_uid".to_string(), Value::Int(self.uid));
                let id = self.backend.insert(&self.descriptor.table_name, &row)?;
                record.id = Some(id);
                Ok(id)
            }
            Some(id) => {
                row.insert("write_date".to_string(), Value::Timestamp(now));
                row.insert("write_uid".to_string(), Value::Int(self.uid));
                self.backend.update(&self.descriptor.table_name, id, &row)?;
                Ok(id)
            }
        }
    }

    /// Delete a row by id.
    pub fn delete(&self, id: i64) -> Result<(), Error> {
        self.backend.delete(&self.descriptor.table_name, id)
    }

    fn validate(&self, record: &Record) -> Result<(), Error> {
        for (name, value) in &record.values {
            let field = self.descriptor.get_field(name).ok_or_else(|| {
                Error::UnknownField {
                    logical_name: self.descriptor.logical_name.clone(),
                    field: name.clone(),
                }
            })?;
            let entry = self.catalog.resolve(&field.kind)?;
            if !value.matches_column(entry.column_type) {
                return Err(Error::KindMismatch {
                    field: name.clone(),
                    expected: entry.column_type.to_string(),
                    actual: value.kind_name().to_string(),
                });
            }
        }
        Ok(())
    }

    fn apply_defaults(&self, row: &mut Row, now: i64) {
        for field in &self.descriptor.fields {
            if row.contains_key(&field.name) {
                continue;
            }
            match &field.default {
                Some(DefaultValue::Literal(value)) => {
                    row.insert(field.name.clone(), value.clone());
                }
                Some(DefaultValue::Now) => {
                    row.insert(field.name.clone(), Value::Timestamp(now));
                }
                None => {}
            }
        }
    }

    fn check_required(&self, row: &Row) -> Result<(), Error> {
        for field in &self.descriptor.fields {
            if !field.required {
                continue;
            }
            let missing = match row.get(&field.name) {
                None => true,
                Some(value) => value.is_null(),
            };
            if missing {
                return Err(Error::MissingRequired {
                    logical_name: self.descriptor.logical_name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDescriptor, FieldKind};
    use crate::schema::SchemaSynchronizer;
    use crate::storage::MemoryBackend;

    fn book() -> EntityDescriptor {
        EntityDescriptor::new("library.book")
            .with_field(FieldDescriptor::new("title", FieldKind::Char).required())
            .with_field(FieldDescriptor::new("isbn", FieldKind::Char))
            .with_field(
                FieldDescriptor::new("available", FieldKind::Boolean)
                    .with_default(Value::Bool(true)),
            )
    }

    fn prepared_backend() -> MemoryBackend {
        let backend = MemoryBackend::new();
        SchemaSynchronizer::new(&backend).synchronize(&book()).unwrap();
        backend
    }

    #[test]
    fn test_save_inserts_with_defaults_and_audit() {
        let backend = prepared_backend();
        let repo = Repository::new(book(), &backend, 1);

        let mut record = Record::new().set("title", Value::Text("Dune".into()));
        let id = repo.save(&mut record).unwrap();
        assert_eq!(record.id, Some(id));

        let row = backend.get("library_book", id).unwrap().unwrap();
        assert_eq!(row["available"], Value::Bool(true));
        assert_eq!(row["create_uid"], Value::Int(1));
        assert_eq!(row["write_uid"], Value::Int(1));
        assert!(matches!(row["create_date"], Value::Timestamp(ts) if ts > 0));
    }

    #[test]
    fn test_save_update_restamps_writer_only() {
        let backend = prepared_backend();
        let repo = Repository::new(book(), &backend, 1);

        let mut record = Record::new().set("title", Value::Text("Dune".into()));
        let id = repo.save(&mut record).unwrap();
        let created = backend.get("library_book", id).unwrap().unwrap();

        let editor = Repository::new(book(), &backend, 7);
        let mut loaded = editor.load(id).unwrap().unwrap();
        loaded.values.insert("isbn".to_string(), Value::Text("0441172717".into()));
        editor.save(&mut loaded).unwrap();

        let row = backend.get("library_book", id).unwrap().unwrap();
        assert_eq!(row["create_uid"], Value::Int(1));
        assert_eq!(row["write_uid"], Value::Int(7));
        assert_eq!(row["create_date"], created["create_date"]);
    }

    #[test]
    fn test_load_strips_audit_columns() {
        let backend = prepared_backend();
        let repo = Repository::new(book(), &backend, 1);

        let mut record = Record::new().set("title", Value::Text("Dune".into()));
        let id = repo.save(&mut record).unwrap();

        let loaded = repo.load(id).unwrap().unwrap();
        assert_eq!(loaded.get("title"), Some(&Value::Text("Dune".into())));
        assert!(loaded.get("create_date").is_none());
        assert!(repo.load(999).unwrap().is_none());
    }

    #[test]
    fn test_save_rejects_unknown_field() {
        let backend = prepared_backend();
        let repo = Repository::new(book(), &backend, 1);

        let mut record = Record::new()
            .set("title", Value::Text("Dune".into()))
            .set("publisher", Value::Text("Ace".into()));
        let err = repo.save(&mut record).unwrap_err();
        assert!(matches!(err, Error::UnknownField { field, .. } if field == "publisher"));
    }

    #[test]
    fn test_save_rejects_kind_mismatch() {
        let backend = prepared_backend();
        let repo = Repository::new(book(), &backend, 1);

        let mut record = Record::new().set("title", Value::Int(42));
        let err = repo.save(&mut record).unwrap_err();
        assert!(matches!(err, Error::KindMismatch { field, .. } if field == "title"));
    }

    #[test]
    fn test_save_rejects_missing_required() {
        let backend = prepared_backend();
        let repo = Repository::new(book(), &backend, 1);

        let mut record = Record::new().set("isbn", Value::Text("0441172717".into()));
        let err = repo.save(&mut record).unwrap_err();
        assert!(matches!(err, Error::MissingRequired { field, .. } if field == "title"));
    }

    #[test]
    fn test_delete() {
        let backend = prepared_backend();
        let repo = Repository::new(book(), &backend, 1);

        let mut record = Record::new().set("title", Value::Text("Dune".into()));
        let id = repo.save(&mut record).unwrap();
        repo.delete(id).unwrap();
        assert!(repo.load(id).unwrap().is_none());
    }
}
