//! Permission model.

use serde::{Deserialize, Serialize};

use super::{default_true, AdminEntity, ResourceKind};

/// A grantable permission code, grouped by the entity it guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub entity: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl AdminEntity for Permission {
    const KIND: ResourceKind = ResourceKind::Permission;
    type Draft = PermissionDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Form draft for creating or editing a permission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionDraft {
    pub code: String,
    pub name: String,
    pub description: String,
    pub entity: String,
    pub is_active: bool,
}

impl Default for PermissionDraft {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            description: String::new(),
            entity: String::new(),
            is_active: true,
        }
    }
}

/// Body sent to the backend. The code is immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub entity: String,
    pub is_active: bool,
}
