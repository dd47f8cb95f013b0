//! Module loading and initialization.
//!
//! Drives the full pipeline for a set of modules: dependency ordering,
//! entity registration, schema synchronization (one scoped transaction
//! per module) and metadata processing. Loading is single-threaded and
//! single-pass; a failure aborts the remaining order but leaves
//! already-initialized modules intact.

use super::graph::DependencyGraph;
use super::{Module, ModuleState, MODEL_NAMESPACE};
use crate::catalog::{EntityDescriptor, FieldDescriptor, FieldKind};
use crate::error::Error;
use crate::metadata::MetadataRecord;
use crate::registry::EntityRegistry;
use crate::repository::{Record, Repository};
use crate::schema::SchemaSynchronizer;
use crate::storage::{Backend, Value};
use crate::ui::{MenuBatch, UiRegistry};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// User id stamped on rows written by the loader itself.
pub const SYSTEM_UID: i64 = 1;

/// Logical name of the bootstrap entity tracking module state.
const MODULE_ENTITY: &str = "base.module";

/// Load mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// First installation; the module must not be initialized yet.
    Install,
    /// Re-run of an installed module; synchronization and metadata
    /// processing are repeated idempotently.
    Update,
}

/// Summary of a completed load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// Modules processed, in load order.
    pub modules: Vec<String>,
}

/// Coordinates registry, synchronizer and UI registry for a module set.
pub struct ModuleLoader<'a> {
    backend: &'a dyn Backend,
    registry: &'a EntityRegistry,
    ui: &'a mut UiRegistry,
    states: HashMap<String, ModuleState>,
}

impl<'a> ModuleLoader<'a> {
    /// Create a loader, bootstrapping the `base.module` state table and
    /// seeding module states from it.
    pub fn new(
        backend: &'a dyn Backend,
        registry: &'a EntityRegistry,
        ui: &'a mut UiRegistry,
    ) -> Result<Self, Error> {
        let descriptor = module_descriptor();
        registry.register("base", MODEL_NAMESPACE, descriptor.clone())?;
        // The bootstrap entity is synchronized eagerly; it never rides
        // inside a module's transaction.
        registry.drain_newly_registered();
        SchemaSynchronizer::new(backend).synchronize(&descriptor)?;

        let mut states = HashMap::new();
        for (_, row) in backend.scan(&descriptor.table_name)? {
            let name = match row.get("name") {
                Some(Value::Text(name)) => name.clone(),
                _ => continue,
            };
            if let Some(Value::Text(state)) = row.get("state") {
                if state == ModuleState::Initialized.as_str() {
                    states.insert(name, ModuleState::Initialized);
                }
            }
        }
        Ok(Self {
            backend,
            registry,
            ui,
            states,
        })
    }

    /// Current lifecycle state of a module.
    pub fn state(&self, module: &str) -> ModuleState {
        self.states.get(module).copied().unwrap_or_default()
    }

    /// Load a module set.
    ///
    /// Modules are processed in topological dependency order, ties
    /// broken by declaration order. Each module runs inside its own
    /// scoped transaction; a failure rolls that module back, is tagged
    /// with the module name and aborts the remaining order.
    pub fn load(&mut self, modules: &[Module], mode: LoadMode) -> Result<LoadReport, Error> {
        let satisfied: HashSet<String> = self
            .states
            .iter()
            .filter(|(_, &state)| state == ModuleState::Initialized)
            .map(|(name, _)| name.clone())
            .collect();
        let order = DependencyGraph::order(modules, &satisfied)?;

        let mut report = LoadReport {
            modules: Vec::with_capacity(order.len()),
        };
        for idx in order {
            let module = &modules[idx];
            self.load_one(module, mode)
                .map_err(|e| e.in_module(&module.name))?;
            report.modules.push(module.name.clone());
        }
        Ok(report)
    }

    fn load_one(&mut self, module: &Module, mode: LoadMode) -> Result<(), Error> {
        let state = self.state(&module.name);
        match mode {
            LoadMode::Install if state == ModuleState::Initialized => {
                return Err(Error::AlreadyInstalled {
                    module: module.name.clone(),
                });
            }
            LoadMode::Update if state != ModuleState::Initialized => {
                return Err(Error::NotInstalled {
                    module: module.name.clone(),
                });
            }
            _ => {}
        }

        info!(module = %module.name, version = %module.version, ?mode, "loading module");
        self.states
            .insert(module.name.clone(), ModuleState::Resolving);
        module.register(self.registry)?;
        self.states.insert(module.name.clone(), ModuleState::Loaded);

        let mut pending = self.registry.drain_newly_registered();
        if mode == LoadMode::Update {
            // An update re-synchronizes everything the module declares,
            // not just what registration found new.
            for declaration in &module.entities {
                if !pending.iter().any(|n| n == &declaration.name) {
                    pending.push(declaration.name.clone());
                }
            }
        }

        self.backend.begin()?;
        match self.initialize(module, &pending) {
            Ok(()) => {
                self.backend.commit()?;
                self.states
                    .insert(module.name.clone(), ModuleState::Initialized);
                info!(module = %module.name, "module initialized");
                Ok(())
            }
            Err(e) => {
                warn!(module = %module.name, error = %e, "module load failed, rolling back");
                self.backend.rollback()?;
                Err(e)
            }
        }
    }

    /// Synchronize schemas, process metadata and record the module row.
    /// Runs inside the module's scoped transaction.
    fn initialize(&mut self, module: &Module, pending: &[String]) -> Result<(), Error> {
        let sync = SchemaSynchronizer::new(self.backend);
        for logical_name in pending {
            let descriptor = self.registry.lookup(logical_name)?;
            sync.synchronize(&descriptor)?;
        }

        let mut batch = MenuBatch::new();
        for file in &module.metadata {
            for record in &file.records {
                match record {
                    MetadataRecord::MenuItem(item) => batch.declare_menu_item(item.clone()),
                    MetadataRecord::Action(action) => batch.declare_action(action.clone()),
                }
            }
        }
        // The UI registry mutates only when the whole batch resolves, so
        // a metadata failure leaves the tree untouched alongside the
        // rolled-back schema.
        self.ui.commit(batch, self.registry)?;

        self.record_module(module)
    }

    /// Upsert the module's row in the bootstrap state table.
    fn record_module(&self, module: &Module) -> Result<(), Error> {
        let descriptor = self.registry.lookup(MODULE_ENTITY)?;
        let table = descriptor.table_name.clone();
        let repository = Repository::new(descriptor, self.backend, SYSTEM_UID);

        let existing = self
            .backend
            .scan(&table)?
            .into_iter()
            .find(|(_, row)| row.get("name") == Some(&Value::Text(module.name.clone())));

        let mut record = Record::new()
            .set("name", Value::Text(module.name.clone()))
            .set("version", Value::Text(module.version.clone()))
            .set(
                "state",
                Value::Text(ModuleState::Initialized.as_str().to_string()),
            );
        record.id = existing.map(|(id, _)| id);
        repository.save(&mut record)?;
        Ok(())
    }
}

/// Descriptor of the bootstrap `base.module` entity.
fn module_descriptor() -> EntityDescriptor {
    EntityDescriptor::new(MODULE_ENTITY)
        .with_field(
            FieldDescriptor::new("name", FieldKind::Char)
                .with_label("Name")
                .required(),
        )
        .with_field(FieldDescriptor::new("version", FieldKind::Char).with_label("Version"))
        .with_field(
            FieldDescriptor::new("state", FieldKind::Char)
                .with_label("State")
                .required(),
        )
}
