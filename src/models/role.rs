//! Role model.

use serde::{Deserialize, Serialize};

use super::{default_true, AdminEntity, ResourceKind};

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl AdminEntity for Role {
    const KIND: ResourceKind = ResourceKind::Role;
    type Draft = RoleDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleDraft {
    pub name: String,
    pub description: String,
    pub permission_ids: Vec<String>,
    pub is_active: bool,
}

impl Default for RoleDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            permission_ids: Vec::new(),
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permission_ids: Vec<String>,
    pub is_active: bool,
}
