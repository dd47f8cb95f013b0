//! Core error types.

use thiserror::Error;

/// Core kernel errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Field kind tag not in the closed set of recognized kinds.
    #[error("unsupported field type '{kind}'")]
    UnsupportedFieldType {
        /// The offending kind tag.
        kind: String,
    },

    /// Entity registered twice with a conflicting definition.
    #[error("duplicate entity '{logical_name}' (conflicting definition)")]
    DuplicateEntity {
        /// Logical name of the entity.
        logical_name: String,
    },

    /// Entity lookup failed.
    #[error("unknown entity '{logical_name}'")]
    UnknownEntity {
        /// Logical name that was looked up.
        logical_name: String,
    },

    /// Declared field conflicts with an existing column type.
    #[error("schema conflict on '{table}.{column}': column is {actual}, declared {declared}")]
    SchemaConflict {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Type already present in storage.
        actual: String,
        /// Type the declaration maps to.
        declared: String,
    },

    /// Module dependency graph contains a cycle.
    #[error("cyclic dependency involving module '{module}'")]
    CyclicDependency {
        /// A module on the cycle.
        module: String,
    },

    /// A declared dependency is not part of the load set.
    #[error("module '{module}' depends on missing module '{dependency}'")]
    MissingDependency {
        /// Module declaring the dependency.
        module: String,
        /// The dependency that could not be resolved.
        dependency: String,
    },

    /// UI element id declared twice with differing content.
    #[error("duplicate ui identifier '{id}'")]
    DuplicateIdentifier {
        /// The duplicated id.
        id: String,
    },

    /// Menu item parent does not resolve within the committed batch.
    #[error("menu item '{id}' references unknown parent '{parent}'")]
    DanglingParent {
        /// The declaring menu item.
        id: String,
        /// The unresolved parent id.
        parent: String,
    },

    /// Menu item action does not resolve to a registered action/entity.
    #[error("menu item '{id}' references unresolved action '{action}'")]
    DanglingAction {
        /// The declaring menu item.
        id: String,
        /// The unresolved action id.
        action: String,
    },

    /// Menu parent chain loops back on itself.
    #[error("menu item '{id}' is part of a parent cycle")]
    MenuCycle {
        /// A menu item on the cycle.
        id: String,
    },

    /// Install requested for a module that is already initialized.
    #[error("module '{module}' is already installed")]
    AlreadyInstalled {
        /// Module name.
        module: String,
    },

    /// Update requested for a module that was never installed.
    #[error("module '{module}' is not installed")]
    NotInstalled {
        /// Module name.
        module: String,
    },

    /// Record carries a field the entity does not declare.
    #[error("entity '{logical_name}' has no field '{field}'")]
    UnknownField {
        /// Logical name of the entity.
        logical_name: String,
        /// The undeclared field.
        field: String,
    },

    /// Record value does not match the declared field kind.
    #[error("field '{field}' expects {expected}, got {actual}")]
    KindMismatch {
        /// Field name.
        field: String,
        /// Expected value shape.
        expected: String,
        /// Actual value shape.
        actual: String,
    },

    /// Required field missing and no default available.
    #[error("missing required field '{field}' on entity '{logical_name}'")]
    MissingRequired {
        /// Logical name of the entity.
        logical_name: String,
        /// The missing field.
        field: String,
    },

    /// Descriptor violates a structural invariant.
    #[error("invalid descriptor '{logical_name}': {reason}")]
    InvalidDescriptor {
        /// Logical name of the entity.
        logical_name: String,
        /// What was violated.
        reason: String,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Metadata file could not be parsed.
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Filesystem error while reading module files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure during a single module's load, with the module attached.
    #[error("module '{module}': {source}")]
    Module {
        /// The module whose load failed.
        module: String,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach a module name to an error raised during that module's load.
    pub fn in_module(self, module: impl Into<String>) -> Self {
        Error::Module {
            module: module.into(),
            source: Box::new(self),
        }
    }
}
