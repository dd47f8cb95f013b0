//! Menu/action tree composition.
//!
//! Declarations are collected into a batch (one batch per module load)
//! and resolved only when the batch is committed, so declaration order
//! within a module's metadata files is irrelevant: a menu item may
//! reference a parent declared later, or in another file of the same
//! module.

use super::action::ActionDef;
use crate::error::Error;
use crate::registry::EntityRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A declared menu item, as it appears in metadata files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemDecl {
    /// Globally unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent menu item id; absent for roots.
    #[serde(default)]
    pub parent: Option<String>,
    /// Sibling sort key.
    #[serde(default = "default_sequence")]
    pub sequence: i32,
    /// Action opened by this leaf.
    #[serde(default)]
    pub action: Option<String>,
}

fn default_sequence() -> i32 {
    10
}

/// A resolved menu item in the committed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    /// Globally unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent menu item id; absent for roots.
    pub parent: Option<String>,
    /// Sibling sort key.
    pub sequence: i32,
    /// Action opened by this leaf.
    pub action: Option<String>,
    /// Commit order, used to break sequence ties.
    decl_index: u64,
}

impl MenuItem {
    fn matches(&self, decl: &MenuItemDecl) -> bool {
        self.name == decl.name
            && self.parent == decl.parent
            && self.sequence == decl.sequence
            && self.action == decl.action
    }
}

/// A batch of UI declarations collected from one module's metadata.
#[derive(Debug, Default)]
pub struct MenuBatch {
    actions: Vec<ActionDef>,
    menu_items: Vec<MenuItemDecl>,
}

impl MenuBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect an action declaration.
    pub fn declare_action(&mut self, action: ActionDef) {
        self.actions.push(action);
    }

    /// Collect a menu item declaration.
    pub fn declare_menu_item(&mut self, item: MenuItemDecl) {
        self.menu_items.push(item);
    }

    /// Check whether the batch holds no declarations.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.menu_items.is_empty()
    }
}

/// Registry of committed menu items and actions.
///
/// Mutated only through [`UiRegistry::commit`] during the load phase;
/// afterwards a read-only lookup structure.
#[derive(Debug, Default)]
pub struct UiRegistry {
    actions: HashMap<String, ActionDef>,
    items: HashMap<String, MenuItem>,
    decl_counter: u64,
}

impl UiRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and apply a batch.
    ///
    /// Validation covers the staged state (already-committed elements
    /// plus the batch): duplicate ids with differing content fail,
    /// identical redeclarations are no-ops, parents and actions must
    /// resolve, parent chains must be acyclic, and every action's target
    /// entity must be registered. On error nothing is applied.
    pub fn commit(&mut self, batch: MenuBatch, entities: &EntityRegistry) -> Result<(), Error> {
        // Actions first: menu items may reference them.
        let mut new_actions: Vec<ActionDef> = Vec::new();
        for action in batch.actions {
            if !entities.contains(&action.target_entity) {
                return Err(Error::UnknownEntity {
                    logical_name: action.target_entity.clone(),
                });
            }
            if let Some(existing) = self.actions.get(&action.id) {
                if *existing == action {
                    continue;
                }
                return Err(Error::DuplicateIdentifier {
                    id: action.id.clone(),
                });
            }
            if let Some(staged) = new_actions.iter().find(|a| a.id == action.id) {
                if *staged == action {
                    continue;
                }
                return Err(Error::DuplicateIdentifier {
                    id: action.id.clone(),
                });
            }
            new_actions.push(action);
        }

        // Stage menu items, collapsing identical redeclarations.
        let mut new_items: Vec<MenuItemDecl> = Vec::new();
        for decl in batch.menu_items {
            if let Some(existing) = self.items.get(&decl.id) {
                if existing.matches(&decl) {
                    continue;
                }
                return Err(Error::DuplicateIdentifier {
                    id: decl.id.clone(),
                });
            }
            if let Some(staged) = new_items.iter().find(|d| d.id == decl.id) {
                if *staged == decl {
                    continue;
                }
                return Err(Error::DuplicateIdentifier {
                    id: decl.id.clone(),
                });
            }
            new_items.push(decl);
        }

        // Reference resolution over the staged state.
        let staged_ids: HashSet<&str> = self
            .items
            .keys()
            .map(String::as_str)
            .chain(new_items.iter().map(|d| d.id.as_str()))
            .collect();
        for decl in &new_items {
            if let Some(parent) = &decl.parent {
                if !staged_ids.contains(parent.as_str()) {
                    return Err(Error::DanglingParent {
                        id: decl.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            if let Some(action) = &decl.action {
                let target = self
                    .actions
                    .get(action)
                    .or_else(|| new_actions.iter().find(|a| a.id == *action));
                let resolved =
                    target.is_some_and(|a| entities.contains(&a.target_entity));
                if !resolved {
                    return Err(Error::DanglingAction {
                        id: decl.id.clone(),
                        action: action.clone(),
                    });
                }
            }
        }

        // Parent chains must terminate at a root.
        let staged_parents: HashMap<&str, Option<&str>> = self
            .items
            .values()
            .map(|i| (i.id.as_str(), i.parent.as_deref()))
            .chain(new_items.iter().map(|d| (d.id.as_str(), d.parent.as_deref())))
            .collect();
        for decl in &new_items {
            let mut seen = HashSet::new();
            let mut cursor = decl.id.as_str();
            while let Some(Some(parent)) = staged_parents.get(cursor) {
                if !seen.insert(cursor) {
                    return Err(Error::MenuCycle {
                        id: decl.id.clone(),
                    });
                }
                cursor = *parent;
            }
        }

        // Validation passed; apply.
        for action in new_actions {
            debug!(action = %action.id, "registered action");
            self.actions.insert(action.id.clone(), action);
        }
        for decl in new_items {
            let decl_index = self.decl_counter;
            self.decl_counter += 1;
            debug!(menu = %decl.id, "registered menu item");
            self.items.insert(
                decl.id.clone(),
                MenuItem {
                    id: decl.id,
                    name: decl.name,
                    parent: decl.parent,
                    sequence: decl.sequence,
                    action: decl.action,
                    decl_index,
                },
            );
        }
        Ok(())
    }

    /// Get a committed menu item.
    pub fn menu_item(&self, id: &str) -> Option<&MenuItem> {
        self.items.get(id)
    }

    /// Get a committed action.
    pub fn action(&self, id: &str) -> Option<&ActionDef> {
        self.actions.get(id)
    }

    /// Root menu items, ordered by `(sequence, declaration order)`.
    pub fn roots(&self) -> Vec<&MenuItem> {
        let mut roots: Vec<&MenuItem> =
            self.items.values().filter(|i| i.parent.is_none()).collect();
        roots.sort_by_key(|i| (i.sequence, i.decl_index));
        roots
    }

    /// Children of a menu item, ordered by `(sequence, declaration order)`.
    pub fn children(&self, id: &str) -> Vec<&MenuItem> {
        let mut children: Vec<&MenuItem> = self
            .items
            .values()
            .filter(|i| i.parent.as_deref() == Some(id))
            .collect();
        children.sort_by_key(|i| (i.sequence, i.decl_index));
        children
    }

    /// Number of committed menu items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if no menu items are committed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
