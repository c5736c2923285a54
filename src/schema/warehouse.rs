use super::{
    code, name, non_negative, optional_text, others, positive_id, same_label, DraftMode,
    DraftSchema, ValidationErrors, CODE_IN_USE, CODE_PATTERN, NAME_IN_USE,
};
use crate::models::{EntityPayload, Warehouse, WarehouseDraft, WarehousePayload};

impl DraftSchema<Warehouse> for WarehouseDraft {
    fn from_entity(entity: &Warehouse) -> Self {
        Self {
            code: entity.code.clone(),
            name: entity.name.clone(),
            address: entity.address.clone().unwrap_or_default(),
            city: entity.city.clone().unwrap_or_default(),
            country_id: entity.country_id.to_string(),
            capacity: entity.capacity.to_string(),
            is_active: entity.is_active,
            is_default: entity.is_default,
        }
    }

    fn validate(&self, _mode: DraftMode) -> Result<EntityPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let code = code(&mut errors, "code", &self.code, &CODE_PATTERN);
        let name = name(&mut errors, "name", &self.name);
        let address = optional_text(&mut errors, "address", &self.address);
        let city = optional_text(&mut errors, "city", &self.city);
        let country_id = positive_id(&mut errors, "countryId", &self.country_id);
        let capacity = non_negative(&mut errors, "capacity", &self.capacity);

        if self.is_default && !self.is_active {
            errors.add("isDefault", "an inactive warehouse cannot be the default");
        }

        errors.into_result(()).map(|()| {
            EntityPayload::Warehouse(WarehousePayload {
                code: code.unwrap_or_default(),
                name: name.unwrap_or_default(),
                address,
                city,
                country_id: country_id.unwrap_or_default(),
                capacity: capacity.unwrap_or_default(),
                is_active: self.is_active,
                is_default: self.is_default,
            })
        })
    }

    fn check_unique(
        &self,
        snapshot: &[Warehouse],
        exclude_id: Option<&str>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for existing in others(snapshot, exclude_id) {
            if same_label(&existing.name, &self.name) && errors.first("name").is_none() {
                errors.add("name", NAME_IN_USE);
            }
            if same_label(&existing.code, &self.code) && errors.first("code").is_none() {
                errors.add("code", CODE_IN_USE);
            }
        }
        errors.into_result(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> WarehouseDraft {
        WarehouseDraft {
            code: "WH_CENTRAL".into(),
            name: "Central".into(),
            country_id: "12".into(),
            capacity: "500".into(),
            ..WarehouseDraft::default()
        }
    }

    #[test]
    fn test_valid_warehouse() {
        match draft().validate(DraftMode::Create).unwrap() {
            EntityPayload::Warehouse(w) => {
                assert_eq!(w.country_id, 12);
                assert_eq!(w.capacity, 500);
                assert!(w.address.is_none());
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_code_pattern_rejects_digits() {
        let errors = WarehouseDraft {
            code: "WH_01".into(),
            ..draft()
        }
        .validate(DraftMode::Create)
        .unwrap_err();
        assert_eq!(errors.first("code"), Some("code must match ^[A-Z_]+$"));
    }

    #[test]
    fn test_numeric_fields_are_checked() {
        let errors = WarehouseDraft {
            country_id: "abc".into(),
            capacity: "-5".into(),
            ..draft()
        }
        .validate(DraftMode::Create)
        .unwrap_err();

        assert!(errors.first("countryId").is_some());
        assert!(errors.first("capacity").is_some());
    }

    #[test]
    fn test_inactive_default_is_rejected() {
        let errors = WarehouseDraft {
            is_active: false,
            is_default: true,
            ..draft()
        }
        .validate(DraftMode::Update)
        .unwrap_err();
        assert!(errors.first("isDefault").is_some());
    }

    #[test]
    fn test_code_collision() {
        let existing = Warehouse {
            id: "w-1".into(),
            code: "wh_01".into(),
            name: "Elsewhere".into(),
            address: None,
            city: None,
            country_id: 3,
            capacity: 10,
            inventory_count: 0,
            image_url: None,
            is_active: true,
            is_default: false,
        };
        let errors = draft().check_unique(&[existing], None).unwrap_err();
        assert_eq!(errors.first("code"), Some(CODE_IN_USE));
        assert!(errors.first("name").is_none());
    }
}
