use super::{
    code, name, optional_text, others, required, same_label, DraftMode, DraftSchema,
    ValidationErrors, CODE_IN_USE, CODE_PATTERN, NAME_IN_USE,
};
use crate::models::{EntityPayload, Permission, PermissionDraft, PermissionPayload};

impl DraftSchema<Permission> for PermissionDraft {
    fn from_entity(entity: &Permission) -> Self {
        Self {
            code: entity.code.clone(),
            name: entity.name.clone(),
            description: entity.description.clone().unwrap_or_default(),
            entity: entity.entity.clone(),
            is_active: entity.is_active,
        }
    }

    fn validate(&self, mode: DraftMode) -> Result<EntityPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let code = match mode {
            DraftMode::Create => code(&mut errors, "code", &self.code, &CODE_PATTERN),
            DraftMode::Update => None,
        };
        let name = name(&mut errors, "name", &self.name);
        let entity = required(&mut errors, "entity", &self.entity);
        let description = optional_text(&mut errors, "description", &self.description);

        errors.into_result(EntityPayload::Permission(PermissionPayload {
            code,
            name: name.unwrap_or_default(),
            description,
            entity: entity.unwrap_or_default().to_uppercase(),
            is_active: self.is_active,
        }))
    }

    fn check_unique(
        &self,
        snapshot: &[Permission],
        exclude_id: Option<&str>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        // Codes are immutable after creation, so they only collide on create.
        let creating = exclude_id.is_none();
        for existing in others(snapshot, exclude_id) {
            if same_label(&existing.name, &self.name) && errors.first("name").is_none() {
                errors.add("name", NAME_IN_USE);
            }
            if creating && same_label(&existing.code, &self.code) && errors.first("code").is_none() {
                errors.add("code", CODE_IN_USE);
            }
        }

        errors.into_result(())
    }
}
