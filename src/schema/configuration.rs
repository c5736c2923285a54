use super::{
    code, max_len, others, positive_id, DraftMode, DraftSchema, ValidationErrors, CODE_PATTERN,
};
use crate::models::{ConfigurationDraft, ConfigurationPayload, EntityPayload, SystemConfiguration};

const MAX_SETTINGS_LEN: usize = 8000;

impl DraftSchema<SystemConfiguration> for ConfigurationDraft {
    fn from_entity(entity: &SystemConfiguration) -> Self {
        Self {
            configuration_type: entity.configuration_type.clone(),
            country_id: entity.country_id.to_string(),
            additional_settings: entity.additional_settings.clone(),
        }
    }

    fn validate(&self, _mode: DraftMode) -> Result<EntityPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let configuration_type = code(
            &mut errors,
            "configurationType",
            &self.configuration_type,
            &CODE_PATTERN,
        );
        let country_id = positive_id(&mut errors, "countryId", &self.country_id);

        // Empty settings are allowed; anything else must be JSON.
        let settings = self.additional_settings.trim();
        max_len(&mut errors, "additionalSettings", settings, MAX_SETTINGS_LEN);
        if !settings.is_empty() && serde_json::from_str::<serde_json::Value>(settings).is_err() {
            errors.add("additionalSettings", "additionalSettings must be valid JSON");
        }

        errors.into_result(()).map(|()| {
            EntityPayload::Configuration(ConfigurationPayload {
                configuration_type: configuration_type.unwrap_or_default(),
                country_id: country_id.unwrap_or_default(),
                additional_settings: settings.to_string(),
            })
        })
    }

    /// One configuration of a given type per country.
    fn check_unique(
        &self,
        snapshot: &[SystemConfiguration],
        exclude_id: Option<&str>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let kind = self.configuration_type.trim();
        // Compared as parsed, the way `validate` sends it; unparsable ids fail there.
        let Ok(country) = self.country_id.trim().parse::<i64>() else {
            return Ok(());
        };
        let taken = others(snapshot, exclude_id).any(|existing| {
            existing.configuration_type == kind && existing.country_id == country
        });
        if taken {
            errors.add(
                "configurationType",
                format!("{} is already configured for country {}", kind, country),
            );
        }
        errors.into_result(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(kind: &str, country: &str, settings: &str) -> ConfigurationDraft {
        ConfigurationDraft {
            configuration_type: kind.into(),
            country_id: country.into(),
            additional_settings: settings.into(),
        }
    }

    #[test]
    fn test_tax_rules_with_empty_settings_is_valid() {
        let payload = draft("TAX_RULES", "12", "").validate(DraftMode::Create).unwrap();
        assert_eq!(
            payload,
            EntityPayload::Configuration(ConfigurationPayload {
                configuration_type: "TAX_RULES".into(),
                country_id: 12,
                additional_settings: String::new(),
            })
        );
    }

    #[test]
    fn test_type_must_be_upper_snake_case() {
        let errors = draft("tax rules", "12", "").validate(DraftMode::Create).unwrap_err();
        assert_eq!(
            errors.first("configurationType"),
            Some("configurationType must match ^[A-Z_]+$")
        );
    }

    #[test]
    fn test_settings_must_be_json() {
        let errors = draft("TAX_RULES", "12", "{not json")
            .validate(DraftMode::Create)
            .unwrap_err();
        assert!(errors.first("additionalSettings").is_some());
        assert!(draft("TAX_RULES", "12", r#"{"rate": 0.2}"#)
            .validate(DraftMode::Create)
            .is_ok());
    }

    #[test]
    fn test_same_type_and_country_collides() {
        let snapshot = vec![SystemConfiguration {
            id: "c-1".into(),
            configuration_type: "TAX_RULES".into(),
            country_id: 12,
            additional_settings: String::new(),
            is_active: true,
            updated_at: None,
        }];
        assert!(draft("TAX_RULES", "12", "").check_unique(&snapshot, None).is_err());
        assert!(draft("TAX_RULES", "13", "").check_unique(&snapshot, None).is_ok());
        assert!(draft("TAX_RULES", "12", "").check_unique(&snapshot, Some("c-1")).is_ok());
    }

    #[test]
    fn test_country_collides_after_parsing() {
        let snapshot = vec![SystemConfiguration {
            id: "c-1".into(),
            configuration_type: "TAX_RULES".into(),
            country_id: 12,
            additional_settings: String::new(),
            is_active: true,
            updated_at: None,
        }];
        let padded = draft("TAX_RULES", " 012 ", "");
        assert!(padded.validate(DraftMode::Create).is_ok());
        let errors = padded.check_unique(&snapshot, None).unwrap_err();
        assert_eq!(
            errors.first("configurationType"),
            Some("TAX_RULES is already configured for country 12")
        );
    }
}
