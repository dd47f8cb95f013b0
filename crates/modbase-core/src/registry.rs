//! Process-wide entity registry.
//!
//! Single source of truth for which entities exist. Populated by module
//! registration hooks during the load phase, then shared read-only with
//! request-handling workers. Constructed once and passed by reference;
//! there is no ambient global instance.

use crate::catalog::EntityDescriptor;
use crate::error::Error;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Outcome of a registration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The descriptor was not known before.
    New,
    /// An identical descriptor was already registered; no-op.
    Unchanged,
}

#[derive(Debug, Clone)]
struct Entry {
    module: String,
    namespace: String,
    descriptor: EntityDescriptor,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// Logical names in registration order.
    order: Vec<String>,
    /// Logical names registered since the last drain. Consumed by the
    /// loader to drive schema synchronization.
    newly_registered: Vec<String>,
}

/// The entity registry (pool).
#[derive(Debug, Default)]
pub struct EntityRegistry {
    inner: RwLock<Inner>,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under `(module, namespace, logical_name)`.
    ///
    /// Identical re-registration is a no-op. A descriptor whose logical
    /// name is already taken by a differing definition, even from
    /// another module, fails with [`Error::DuplicateEntity`].
    pub fn register(
        &self,
        module: &str,
        namespace: &str,
        descriptor: EntityDescriptor,
    ) -> Result<Registration, Error> {
        descriptor.validate()?;

        let mut inner = self.inner.write();
        if let Some(existing) = inner.entries.get(&descriptor.logical_name) {
            if existing.module == module
                && existing.namespace == namespace
                && existing.descriptor == descriptor
            {
                return Ok(Registration::Unchanged);
            }
            return Err(Error::DuplicateEntity {
                logical_name: descriptor.logical_name.clone(),
            });
        }

        debug!(
            module,
            namespace,
            entity = %descriptor.logical_name,
            "registered entity"
        );
        let logical_name = descriptor.logical_name.clone();
        inner.order.push(logical_name.clone());
        inner.newly_registered.push(logical_name.clone());
        inner.entries.insert(
            logical_name,
            Entry {
                module: module.to_string(),
                namespace: namespace.to_string(),
                descriptor,
            },
        );
        Ok(Registration::New)
    }

    /// Look up a descriptor by logical name.
    pub fn lookup(&self, logical_name: &str) -> Result<EntityDescriptor, Error> {
        let inner = self.inner.read();
        inner
            .entries
            .get(logical_name)
            .map(|e| e.descriptor.clone())
            .ok_or_else(|| Error::UnknownEntity {
                logical_name: logical_name.to_string(),
            })
    }

    /// Check whether a logical name is registered.
    pub fn contains(&self, logical_name: &str) -> bool {
        self.inner.read().entries.contains_key(logical_name)
    }

    /// The module that registered an entity.
    pub fn owner_module(&self, logical_name: &str) -> Option<String> {
        self.inner
            .read()
            .entries
            .get(logical_name)
            .map(|e| e.module.clone())
    }

    /// Lazy, restartable sequence of all descriptors registered under a
    /// namespace, in registration order.
    pub fn all_of<'a>(&'a self, namespace: &str) -> AllOf<'a> {
        AllOf {
            registry: self,
            namespace: namespace.to_string(),
            pos: 0,
        }
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the logical names registered since the last call.
    pub fn drain_newly_registered(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.write().newly_registered)
    }
}

/// Iterator over the descriptors of one namespace.
///
/// Descriptors are cloned out on each step so the registry lock is never
/// held across iterations.
pub struct AllOf<'a> {
    registry: &'a EntityRegistry,
    namespace: String,
    pos: usize,
}

impl Iterator for AllOf<'_> {
    type Item = EntityDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.registry.inner.read();
        while self.pos < inner.order.len() {
            let name = &inner.order[self.pos];
            self.pos += 1;
            if let Some(entry) = inner.entries.get(name) {
                if entry.namespace == self.namespace {
                    return Some(entry.descriptor.clone());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDescriptor, FieldKind};

    fn book() -> EntityDescriptor {
        EntityDescriptor::new("library.book")
            .with_field(FieldDescriptor::new("title", FieldKind::Char).required())
            .with_field(FieldDescriptor::new("isbn", FieldKind::Char))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = EntityRegistry::new();
        let outcome = registry.register("library", "model", book()).unwrap();
        assert_eq!(outcome, Registration::New);

        let found = registry.lookup("library.book").unwrap();
        assert_eq!(found.table_name, "library_book");
        assert_eq!(registry.owner_module("library.book").as_deref(), Some("library"));

        let err = registry.lookup("library.member").unwrap_err();
        assert!(matches!(err, Error::UnknownEntity { .. }));
    }

    #[test]
    fn test_identical_registration_is_noop() {
        let registry = EntityRegistry::new();
        registry.register("library", "model", book()).unwrap();
        let outcome = registry.register("library", "model", book()).unwrap();
        assert_eq!(outcome, Registration::Unchanged);
        assert_eq!(registry.len(), 1);
        // Only the first registration is reported as new.
        assert_eq!(registry.drain_newly_registered(), vec!["library.book"]);
        assert!(registry.drain_newly_registered().is_empty());
    }

    #[test]
    fn test_conflicting_registration_fails() {
        let registry = EntityRegistry::new();
        registry.register("library", "model", book()).unwrap();

        let changed = EntityDescriptor::new("library.book")
            .with_field(FieldDescriptor::new("title", FieldKind::Text));
        let err = registry.register("library", "model", changed).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntity { .. }));

        // Same definition from an unrelated module is also a conflict.
        let err = registry.register("archive", "model", book()).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntity { .. }));
    }

    #[test]
    fn test_all_of_is_ordered_and_restartable() {
        let registry = EntityRegistry::new();
        registry.register("library", "model", book()).unwrap();
        registry
            .register(
                "library",
                "model",
                EntityDescriptor::new("library.member")
                    .with_field(FieldDescriptor::new("name", FieldKind::Char)),
            )
            .unwrap();
        registry
            .register(
                "library",
                "report",
                EntityDescriptor::new("library.loan_report"),
            )
            .unwrap();

        let names: Vec<String> = registry
            .all_of("model")
            .map(|d| d.logical_name)
            .collect();
        assert_eq!(names, vec!["library.book", "library.member"]);

        // Restartable: a second pass yields the same sequence.
        let again: Vec<String> = registry.all_of("model").map(|d| d.logical_name).collect();
        assert_eq!(names, again);
    }
}
