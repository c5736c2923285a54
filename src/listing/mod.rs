//! List pages: URL view state and permission-gated actions.

mod view_state;

pub use view_state::*;

use serde::Serialize;

use crate::models::{AdminEntity, ResourceKind};
use crate::permissions::{Action, PermissionSet};

/// A per-row menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowAction {
    View,
    Edit,
    Delete,
    SetCurrent,
}

impl RowAction {
    fn required(&self) -> Action {
        match self {
            RowAction::View => Action::View,
            RowAction::Edit => Action::Update,
            RowAction::Delete => Action::Delete,
            RowAction::SetCurrent => Action::SetCurrent,
        }
    }
}

/// A list-level toolbar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolbarAction {
    Create,
}

/// Whether the toolbar shows the create button.
pub fn can_create(kind: ResourceKind, permissions: &PermissionSet) -> bool {
    permissions.shows(kind, Action::Create)
}

pub fn toolbar_actions(kind: ResourceKind, permissions: &PermissionSet) -> Vec<ToolbarAction> {
    if can_create(kind, permissions) {
        vec![ToolbarAction::Create]
    } else {
        Vec::new()
    }
}

/// Visible actions of one row, in menu order.
pub fn row_actions<E: AdminEntity>(permissions: &PermissionSet, row: &E) -> Vec<RowAction> {
    let mut candidates = vec![RowAction::View, RowAction::Edit, RowAction::Delete];
    // Only a configuration that is not yet current can be made current.
    if E::KIND == ResourceKind::Configuration && !row.is_active() {
        candidates.push(RowAction::SetCurrent);
    }

    candidates
        .into_iter()
        .filter(|action| permissions.shows(E::KIND, action.required()))
        .collect()
}
