//! Resource route table and the trait binding an entity type to it.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::forms::DraftForm;
use crate::schema::DraftSchema;

/// The admin resources proxied to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Permission,
    Role,
    Warehouse,
    Configuration,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Permission,
        ResourceKind::Role,
        ResourceKind::Warehouse,
        ResourceKind::Configuration,
    ];

    /// Backend route segment, also used as the public route.
    pub fn route(&self) -> &'static str {
        match self {
            ResourceKind::Permission => "permissions",
            ResourceKind::Role => "roles",
            ResourceKind::Warehouse => "warehouses",
            ResourceKind::Configuration => "system-configurations",
        }
    }

    pub fn from_route(route: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.route() == route)
    }

    pub fn cache_tag(&self) -> &'static str {
        self.route()
    }

    /// Tags made stale by a successful mutation of this resource.
    pub fn invalidates(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Permission => &["permissions"],
            // Permission lists filtered by roleId depend on role assignments.
            ResourceKind::Role => &["roles", "permissions"],
            ResourceKind::Warehouse => &["warehouses"],
            ResourceKind::Configuration => &["system-configurations"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Permission => "Permission",
            ResourceKind::Role => "Role",
            ResourceKind::Warehouse => "Warehouse",
            ResourceKind::Configuration => "System configuration",
        }
    }

    pub fn permission_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Permission => "PERMISSION",
            ResourceKind::Role => "ROLE",
            ResourceKind::Warehouse => "WAREHOUSE",
            ResourceKind::Configuration => "SYSTEM_CONFIGURATION",
        }
    }

    /// Entity-specific filter keys recognized in the view state.
    pub fn filters(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Permission => &["entity", "roleId", "isActive"],
            ResourceKind::Role => &["isActive"],
            ResourceKind::Warehouse => &["countryId", "isActive"],
            ResourceKind::Configuration => &["type", "countryId", "isActive"],
        }
    }

    /// Name of a view-state filter as the backend expects it.
    pub fn upstream_filter<'a>(&self, filter: &'a str) -> &'a str {
        match (self, filter) {
            (ResourceKind::Configuration, "type") => "configurationType",
            (_, other) => other,
        }
    }

    /// Record fields matched by the free-text `search` parameter.
    pub fn search_fields(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Permission => &["code", "name", "entity"],
            ResourceKind::Role => &["name", "description"],
            ResourceKind::Warehouse => &["code", "name", "city"],
            ResourceKind::Configuration => &["configurationType", "additionalSettings"],
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.route())
    }
}

/// A backend-owned record exposed through the gateway.
pub trait AdminEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// What the create/edit form collects for this entity.
    type Draft: DraftSchema<Self> + DraftForm;

    fn id(&self) -> &str;

    /// Whether the record is the active variant (current configuration, active role, ...).
    fn is_active(&self) -> bool;
}
