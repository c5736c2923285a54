//! Permission codes granted to the current user.
//!
//! Codes are `<RESOURCE>_<ACTION>`, e.g. `WAREHOUSE_CREATE`. A UI action is
//! visible only when every code it requires is present.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::ResourceKind;

/// Operations guarded by a permission code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    SetCurrent,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "VIEW",
            Action::Create => "CREATE",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
            Action::SetCurrent => "SET_CURRENT",
        }
    }

    /// Actions that exist for a resource.
    pub fn for_kind(kind: ResourceKind) -> &'static [Action] {
        match kind {
            ResourceKind::Configuration => &[
                Action::View,
                Action::Create,
                Action::Update,
                Action::Delete,
                Action::SetCurrent,
            ],
            _ => &[Action::View, Action::Create, Action::Update, Action::Delete],
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::SetCurrent => "activate",
        }
    }
}

/// Code required to perform `action` on `kind`.
pub fn permission_code(kind: ResourceKind, action: Action) -> String {
    format!("{}_{}", kind.permission_prefix(), action.as_str())
}

/// Codes a UI control checks before it is shown. Acting on an existing
/// record also needs the view code of its resource.
pub fn required_codes(kind: ResourceKind, action: Action) -> Vec<String> {
    match action {
        Action::View | Action::Create => vec![permission_code(kind, action)],
        Action::Update | Action::Delete | Action::SetCurrent => vec![
            permission_code(kind, Action::View),
            permission_code(kind, action),
        ],
    }
}

/// Message shown when a gated action is attempted anyway.
pub fn denied_message(kind: ResourceKind, action: Action) -> String {
    format!(
        "You do not have permission to {} {} records ({} required)",
        action.verb(),
        kind.label().to_lowercase(),
        permission_code(kind, action)
    )
}

/// The set of codes granted to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            codes
                .into_iter()
                .map(Into::into)
                .map(|code: String| code.trim().to_string())
                .filter(|code| !code.is_empty())
                .collect(),
        )
    }

    /// Parse a comma or whitespace separated list, as forwarded by the SSO proxy.
    pub fn parse(header: &str) -> Self {
        Self::new(header.split(|c: char| c == ',' || c.is_whitespace()))
    }

    pub fn has(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    /// Every required code is present. An empty requirement always passes.
    pub fn has_all<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|code| self.has(code.as_ref()))
    }

    pub fn allows(&self, kind: ResourceKind, action: Action) -> bool {
        self.has(&permission_code(kind, action))
    }

    /// Whether a UI control for `action` on `kind` is shown.
    pub fn shows(&self, kind: ResourceKind, action: Action) -> bool {
        self.has_all(&required_codes(kind, action))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
