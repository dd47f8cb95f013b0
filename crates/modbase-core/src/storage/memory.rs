//! In-memory backend.
//!
//! Reference implementation of the [`Backend`] contract, used by tests
//! and the CLI's default profile. Transactions are implemented as a
//! whole-state snapshot: `begin` clones the table map, `rollback`
//! restores it.

use super::backend::{Backend, Row, TableInfo, TableSpec, Value};
use crate::catalog::ColumnSpec;
use crate::error::Error;
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Table {
    spec: TableSpec,
    rows: BTreeMap<i64, Row>,
    next_id: i64,
}

#[derive(Debug, Clone, Default)]
struct State {
    tables: BTreeMap<String, Table>,
}

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
    snapshot: Mutex<Option<State>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn storage_err(msg: impl Into<String>) -> Error {
        Error::Storage(msg.into())
    }
}

impl Backend for MemoryBackend {
    fn table_info(&self, table: &str) -> Result<Option<TableInfo>, Error> {
        let state = self.state.lock();
        Ok(state.tables.get(table).map(|t| TableInfo {
            name: t.spec.name.clone(),
            columns: t.spec.columns.clone(),
        }))
    }

    fn create_table(&self, spec: &TableSpec) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.tables.contains_key(&spec.name) {
            return Err(Self::storage_err(format!(
                "table '{}' already exists",
                spec.name
            )));
        }
        state.tables.insert(
            spec.name.clone(),
            Table {
                spec: spec.clone(),
                rows: BTreeMap::new(),
                next_id: 1,
            },
        );
        Ok(())
    }

    fn add_column(
        &self,
        table: &str,
        column: &ColumnSpec,
        backfill: Option<&Value>,
    ) -> Result<(), Error> {
        let mut state = self.state.lock();
        let table = state
            .tables
            .get_mut(table)
            .ok_or_else(|| Self::storage_err(format!("no such table '{table}'")))?;
        if table.spec.get_column(&column.name).is_some() {
            return Err(Self::storage_err(format!(
                "column '{}' already exists on '{}'",
                column.name, table.spec.name
            )));
        }
        table.spec.columns.push(column.clone());
        if let Some(value) = backfill {
            for row in table.rows.values_mut() {
                row.insert(column.name.clone(), value.clone());
            }
        }
        Ok(())
    }

    fn begin(&self) -> Result<(), Error> {
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            return Err(Self::storage_err("transaction already open"));
        }
        *snapshot = Some(self.state.lock().clone());
        Ok(())
    }

    fn commit(&self) -> Result<(), Error> {
        let mut snapshot = self.snapshot.lock();
        if snapshot.take().is_none() {
            return Err(Self::storage_err("no open transaction"));
        }
        Ok(())
    }

    fn rollback(&self) -> Result<(), Error> {
        let mut snapshot = self.snapshot.lock();
        match snapshot.take() {
            Some(saved) => {
                *self.state.lock() = saved;
                Ok(())
            }
            None => Err(Self::storage_err("no open transaction")),
        }
    }

    fn insert(&self, table: &str, row: &Row) -> Result<i64, Error> {
        let mut state = self.state.lock();
        let table = state
            .tables
            .get_mut(table)
            .ok_or_else(|| Self::storage_err(format!("no such table '{table}'")))?;
        for name in row.keys() {
            if table.spec.get_column(name).is_none() {
                return Err(Self::storage_err(format!(
                    "no column '{}' on '{}'",
                    name, table.spec.name
                )));
            }
        }
        let id = table.next_id;
        table.next_id += 1;
        table.rows.insert(id, row.clone());
        Ok(id)
    }

    fn update(&self, table: &str, id: i64, row: &Row) -> Result<(), Error> {
        let mut state = self.state.lock();
        let table = state
            .tables
            .get_mut(table)
            .ok_or_else(|| Self::storage_err(format!("no such table '{table}'")))?;
        for name in row.keys() {
            if table.spec.get_column(name).is_none() {
                return Err(Self::storage_err(format!(
                    "no column '{}' on '{}'",
                    name, table.spec.name
                )));
            }
        }
        let table_name = table.spec.name.clone();
        let existing = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| Self::storage_err(format!("no row {id} in '{table_name}'")))?;
        for (name, value) in row {
            existing.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    fn get(&self, table: &str, id: i64) -> Result<Option<Row>, Error> {
        let state = self.state.lock();
        let table = state
            .tables
            .get(table)
            .ok_or_else(|| Self::storage_err(format!("no such table '{table}'")))?;
        Ok(table.rows.get(&id).cloned())
    }

    fn delete(&self, table: &str, id: i64) -> Result<(), Error> {
        let mut state = self.state.lock();
        let table = state
            .tables
            .get_mut(table)
            .ok_or_else(|| Self::storage_err(format!("no such table '{table}'")))?;
        table.rows.remove(&id);
        Ok(())
    }

    fn scan(&self, table: &str) -> Result<Vec<(i64, Row)>, Error> {
        let state = self.state.lock();
        let table = state
            .tables
            .get(table)
            .ok_or_else(|| Self::storage_err(format!("no such table '{table}'")))?;
        Ok(table
            .rows
            .iter()
            .map(|(id, row)| (*id, row.clone()))
            .collect())
    }
}
