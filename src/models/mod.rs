//! Data models for the admin console resources.
//!
//! Field names match the backend's camelCase JSON contract.

mod configuration;
mod envelope;
mod permission;
mod resource;
mod role;
mod warehouse;

pub use configuration::*;
pub use envelope::*;
pub use permission::*;
pub use resource::*;
pub use role::*;
pub use warehouse::*;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Validated body of a create or update call, one variant per entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityPayload {
    Permission(PermissionPayload),
    Role(RolePayload),
    Warehouse(WarehousePayload),
    Configuration(ConfigurationPayload),
}

impl EntityPayload {
    pub fn kind(&self) -> ResourceKind {
        match self {
            EntityPayload::Permission(_) => ResourceKind::Permission,
            EntityPayload::Role(_) => ResourceKind::Role,
            EntityPayload::Warehouse(_) => ResourceKind::Warehouse,
            EntityPayload::Configuration(_) => ResourceKind::Configuration,
        }
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

pub(crate) fn default_true() -> bool {
    true
}

/// Accept a string, a number or null for form fields that hold typed text.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or a number, got {}",
            other
        ))),
    }
}
