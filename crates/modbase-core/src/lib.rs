//! Modbase Core - entity catalog, registry, schema synchronization and
//! module loading.
//!
//! The kernel of a declaratively-composed application: modules declare
//! entities and menus, the loader initializes them in dependency order,
//! and the synchronizer keeps the relational schema append-only in sync
//! with the declarations.

pub mod catalog;
pub mod error;
pub mod metadata;
pub mod module;
pub mod registry;
pub mod repository;
pub mod schema;
pub mod storage;
pub mod ui;

pub use catalog::{
    ColumnSpec, ColumnType, DefaultValue, EntityDescriptor, FieldDescriptor, FieldKind,
    FieldTypeCatalog, AUDIT_COLUMNS,
};
pub use error::Error;
pub use metadata::{
    EntityDeclaration, FieldDeclaration, MetadataFile, MetadataRecord, ModuleManifest,
};
pub use module::{
    DependencyGraph, LoadMode, LoadReport, Module, ModuleLoader, ModuleState, SYSTEM_UID,
};
pub use registry::{EntityRegistry, Registration};
pub use repository::{Record, Repository};
pub use schema::SchemaSynchronizer;
pub use storage::{Backend, MemoryBackend, Row, TableInfo, TableSpec, Value};
pub use ui::{ActionDef, MenuBatch, MenuItem, MenuItemDecl, UiRegistry, ViewMode};
