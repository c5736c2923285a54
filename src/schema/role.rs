use super::{
    name, optional_text, others, same_label, DraftMode, DraftSchema, ValidationErrors,
    NAME_IN_USE,
};
use crate::models::{EntityPayload, Role, RoleDraft, RolePayload};

impl DraftSchema<Role> for RoleDraft {
    fn from_entity(entity: &Role) -> Self {
        Self {
            name: entity.name.clone(),
            description: entity.description.clone().unwrap_or_default(),
            permission_ids: entity.permission_ids.clone(),
            is_active: entity.is_active,
        }
    }

    fn validate(&self, _mode: DraftMode) -> Result<EntityPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = name(&mut errors, "name", &self.name);
        let description = optional_text(&mut errors, "description", &self.description);

        let mut permission_ids: Vec<String> = Vec::with_capacity(self.permission_ids.len());
        for id in &self.permission_ids {
            let id = id.trim();
            if id.is_empty() {
                errors.add("permissionIds", "permissionIds must not contain blank ids");
                break;
            }
            if !permission_ids.iter().any(|existing| existing == id) {
                permission_ids.push(id.to_string());
            }
        }

        errors.into_result(()).map(|()| {
            EntityPayload::Role(RolePayload {
                name: name.unwrap_or_default(),
                description,
                permission_ids,
                is_active: self.is_active,
            })
        })
    }

    fn check_unique(&self, snapshot: &[Role], exclude_id: Option<&str>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if others(snapshot, exclude_id).any(|role| same_label(&role.name, &self.name)) {
            errors.add("name", NAME_IN_USE);
        }
        errors.into_result(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_permission_ids_are_collapsed() {
        let draft = RoleDraft {
            name: "Auditor".into(),
            permission_ids: vec!["p-1".into(), " p-1 ".into(), "p-2".into()],
            ..RoleDraft::default()
        };
        match draft.validate(DraftMode::Create).unwrap() {
            EntityPayload::Role(role) => assert_eq!(role.permission_ids, vec!["p-1", "p-2"]),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_blank_name_is_required() {
        let errors = RoleDraft::default().validate(DraftMode::Create).unwrap_err();
        assert_eq!(errors.first("name"), Some("name is required"));
    }

    #[test]
    fn test_role_name_in_use() {
        let snapshot = vec![Role {
            id: "r-1".into(),
            name: "Administrator".into(),
            description: None,
            permission_ids: vec![],
            is_active: true,
        }];
        let draft = RoleDraft {
            name: "ADMINISTRATOR ".into(),
            ..RoleDraft::default()
        };
        assert_eq!(
            draft.check_unique(&snapshot, None).unwrap_err().first("name"),
            Some(NAME_IN_USE)
        );
        assert!(draft.check_unique(&snapshot, Some("r-1")).is_ok());
    }
}
