//! Window actions.

use serde::{Deserialize, Serialize};

/// How a view presents the target entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Flat record list.
    List,
    /// Single-record detail form.
    Form,
    /// Hierarchical list.
    Tree,
}

/// An action opening views over one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Globally unique action id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Logical name of the entity the action opens.
    pub target_entity: String,
    /// View kinds, in presentation order.
    #[serde(default = "default_view_mode")]
    pub view_mode: Vec<ViewMode>,
}

fn default_view_mode() -> Vec<ViewMode> {
    vec![ViewMode::List, ViewMode::Form]
}

impl ActionDef {
    /// Create an action with the default list-then-form presentation.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        target_entity: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_entity: target_entity.into(),
            view_mode: default_view_mode(),
        }
    }

    /// Set the view kinds.
    pub fn with_view_mode(mut self, view_mode: Vec<ViewMode>) -> Self {
        self.view_mode = view_mode;
        self
    }
}
