//! Modules: named, versioned units of entity and UI declarations.

mod graph;
mod loader;

pub use graph::DependencyGraph;
pub use loader::{LoadMode, LoadReport, ModuleLoader, SYSTEM_UID};

use crate::error::Error;
use crate::metadata::{EntityDeclaration, MetadataFile, ModuleManifest};
use crate::registry::EntityRegistry;

/// Namespace under which module entities register.
pub const MODEL_NAMESPACE: &str = "model";

/// Lifecycle of a module inside the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleState {
    /// Not seen by the loader yet.
    #[default]
    Unregistered,
    /// Dependency resolution done, registration hook running.
    Resolving,
    /// Entities registered, not yet synchronized.
    Loaded,
    /// Schema synchronized and metadata processed.
    Initialized,
}

impl ModuleState {
    /// Persisted state tag.
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleState::Unregistered => "unregistered",
            ModuleState::Resolving => "resolving",
            ModuleState::Loaded => "loaded",
            ModuleState::Initialized => "initialized",
        }
    }
}

/// A module to load: manifest data plus its declarations.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Unique module name.
    pub name: String,
    /// Version string.
    pub version: String,
    /// Modules that must be initialized first.
    pub depends: Vec<String>,
    /// Declared entities, in declaration order.
    pub entities: Vec<EntityDeclaration>,
    /// Parsed metadata files, in the manifest's listed order.
    pub metadata: Vec<MetadataFile>,
}

impl Module {
    /// Create a module with no declarations.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Build a module from a parsed manifest and its files.
    pub fn from_manifest(
        name: impl Into<String>,
        manifest: ModuleManifest,
        entities: Vec<EntityDeclaration>,
        metadata: Vec<MetadataFile>,
    ) -> Self {
        Self {
            name: name.into(),
            version: manifest.version,
            depends: manifest.depends,
            entities,
            metadata,
        }
    }

    /// Add a dependency.
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.depends.push(name.into());
        self
    }

    /// Add an entity declaration.
    pub fn with_entity(mut self, entity: EntityDeclaration) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add a metadata file.
    pub fn with_metadata(mut self, file: MetadataFile) -> Self {
        self.metadata.push(file);
        self
    }

    /// Registration hook: register every declared entity.
    ///
    /// Invoked explicitly by the loader in dependency order; nothing is
    /// registered as a side effect of constructing or parsing a module.
    pub fn register(&self, registry: &EntityRegistry) -> Result<(), Error> {
        for declaration in &self.entities {
            let descriptor = declaration.to_descriptor()?;
            registry.register(&self.name, MODEL_NAMESPACE, descriptor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_hook() {
        let registry = EntityRegistry::new();
        let module = Module::new("library", "1.0").with_entity(
            serde_json::from_str(
                r#"{"name": "library.book",
                    "fields": [{"name": "title", "kind": "char", "required": true}]}"#,
            )
            .unwrap(),
        );

        module.register(&registry).unwrap();
        assert!(registry.contains("library.book"));
        // Re-running the hook is a no-op.
        module.register(&registry).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_state_tags() {
        assert_eq!(ModuleState::Initialized.as_str(), "initialized");
        assert_eq!(ModuleState::default(), ModuleState::Unregistered);
    }
}
