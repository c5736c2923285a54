//! Warehouse model.

use serde::{Deserialize, Serialize};

use super::{default_true, lenient_string, AdminEntity, ResourceKind};

/// A storage location. `inventory_count` is owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub country_id: i64,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub inventory_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
}

impl Warehouse {
    pub fn has_inventory(&self) -> bool {
        self.inventory_count > 0
    }
}

impl AdminEntity for Warehouse {
    const KIND: ResourceKind = ResourceKind::Warehouse;
    type Draft = WarehouseDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Numeric fields stay textual until validated, as typed in the form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarehouseDraft {
    pub code: String,
    pub name: String,
    pub address: String,
    pub city: String,
    #[serde(deserialize_with = "lenient_string")]
    pub country_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub capacity: String,
    pub is_active: bool,
    pub is_default: bool,
}

impl Default for WarehouseDraft {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            address: String::new(),
            city: String::new(),
            country_id: String::new(),
            capacity: "0".to_string(),
            is_active: true,
            is_default: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehousePayload {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub country_id: i64,
    pub capacity: u32,
    pub is_active: bool,
    pub is_default: bool,
}
