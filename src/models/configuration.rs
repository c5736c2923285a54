//! System configuration model.

use serde::{Deserialize, Serialize};

use super::{lenient_string, AdminEntity, ResourceKind};

/// A per-country configuration variant. At most one per country is current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfiguration {
    pub id: String,
    pub configuration_type: String,
    pub country_id: i64,
    #[serde(default)]
    pub additional_settings: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl AdminEntity for SystemConfiguration {
    const KIND: ResourceKind = ResourceKind::Configuration;
    type Draft = ConfigurationDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigurationDraft {
    pub configuration_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub country_id: String,
    pub additional_settings: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationPayload {
    pub configuration_type: String,
    pub country_id: i64,
    pub additional_settings: String,
}

/// Configuration types offered by the console's type selector.
pub const KNOWN_CONFIGURATION_TYPES: &[&str] = &[
    "TAX_RULES",
    "SHIPPING_RULES",
    "CURRENCY",
    "INVOICE_NUMBERING",
    "NOTIFICATION_SETTINGS",
];
