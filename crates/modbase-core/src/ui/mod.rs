//! Declarative UI composition: menu items and window actions.

mod action;
mod menu;

pub use action::{ActionDef, ViewMode};
pub use menu::{MenuBatch, MenuItem, MenuItemDecl, UiRegistry};
