//! Form layouts of the entity dialogs.

use super::{DraftForm, FormDraft, FormField, SelectOption};
use crate::models::{
    ConfigurationDraft, PermissionDraft, ResourceKind, RoleDraft, WarehouseDraft,
    KNOWN_CONFIGURATION_TYPES,
};

impl DraftForm for PermissionDraft {
    fn to_form(&self) -> FormDraft {
        FormDraft::new(vec![
            FormField::text("code", "Code").required().with_text(&self.code),
            FormField::text("name", "Name").required().with_text(&self.name),
            FormField::text("entity", "Entity").required().with_text(&self.entity),
            FormField::textarea("description", "Description").with_text(&self.description),
            FormField::switch("isActive", "Active").with_flag(self.is_active),
        ])
    }

    fn from_form(form: &FormDraft) -> Self {
        Self {
            code: form.text("code"),
            name: form.text("name"),
            description: form.text("description"),
            entity: form.text("entity"),
            is_active: form.flag("isActive"),
        }
    }

    fn immutable_fields() -> &'static [&'static str] {
        &["code"]
    }
}

impl DraftForm for RoleDraft {
    fn to_form(&self) -> FormDraft {
        FormDraft::new(vec![
            FormField::text("name", "Name").required().with_text(&self.name),
            FormField::rich_text("description", "Description").with_text(&self.description),
            FormField::multi_select("permissionIds", "Permissions", Vec::new())
                .with_list(self.permission_ids.clone()),
            FormField::switch("isActive", "Active").with_flag(self.is_active),
        ])
    }

    fn from_form(form: &FormDraft) -> Self {
        Self {
            name: form.text("name"),
            description: form.text("description"),
            permission_ids: form.list("permissionIds"),
            is_active: form.flag("isActive"),
        }
    }

    fn lookups() -> &'static [(&'static str, ResourceKind)] {
        &[("permissionIds", ResourceKind::Permission)]
    }
}

impl DraftForm for WarehouseDraft {
    fn to_form(&self) -> FormDraft {
        FormDraft::new(vec![
            FormField::text("code", "Code").required().with_text(&self.code),
            FormField::text("name", "Name").required().with_text(&self.name),
            FormField::text("address", "Address").with_text(&self.address),
            FormField::text("city", "City").with_text(&self.city),
            FormField::number("countryId", "Country").required().with_text(&self.country_id),
            FormField::number("capacity", "Capacity").with_text(&self.capacity),
            FormField::checkbox("isDefault", "Default warehouse").with_flag(self.is_default),
            FormField::switch("isActive", "Active").with_flag(self.is_active),
        ])
    }

    fn from_form(form: &FormDraft) -> Self {
        Self {
            code: form.text("code"),
            name: form.text("name"),
            address: form.text("address"),
            city: form.text("city"),
            country_id: form.text("countryId"),
            capacity: form.text("capacity"),
            is_active: form.flag("isActive"),
            is_default: form.flag("isDefault"),
        }
    }
}

impl DraftForm for ConfigurationDraft {
    fn to_form(&self) -> FormDraft {
        let mut types: Vec<SelectOption> = KNOWN_CONFIGURATION_TYPES
            .iter()
            .map(|kind| SelectOption::new(*kind, kind.replace('_', " ")))
            .collect();
        // Keep an unknown stored type selectable when editing.
        if !self.configuration_type.is_empty()
            && !types.iter().any(|option| option.value == self.configuration_type)
        {
            types.push(SelectOption::new(
                self.configuration_type.clone(),
                self.configuration_type.clone(),
            ));
        }

        FormDraft::new(vec![
            FormField::select("configurationType", "Configuration type", types)
                .required()
                .with_text(&self.configuration_type),
            FormField::number("countryId", "Country").required().with_text(&self.country_id),
            FormField::textarea("additionalSettings", "Additional settings")
                .with_text(&self.additional_settings),
        ])
    }

    fn from_form(form: &FormDraft) -> Self {
        Self {
            configuration_type: form.text("configurationType"),
            country_id: form.text("countryId"),
            additional_settings: form.text("additionalSettings"),
        }
    }
}
