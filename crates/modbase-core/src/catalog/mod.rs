//! Entity catalog: field kinds, field and entity descriptors.

mod entity;
mod field;
mod types;

pub use entity::{EntityDescriptor, AUDIT_COLUMNS};
pub use field::{DefaultValue, FieldDescriptor};
pub use types::{ColumnSpec, ColumnType, FieldKind, FieldTypeCatalog, TypeEntry};
