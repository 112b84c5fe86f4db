use bevy_ecs::prelude::*;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for property extraction and coercion.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// How many levels of sub-model groups extraction descends into.
    pub max_nesting_depth: usize,
    /// Formats tried, in order, when text is coerced to a date.
    pub date_formats: Vec<String>,
    /// Format used when a date is rendered for display.
    pub display_date_format: String,
    /// Append the units to sub-model group labels, e.g. `Irrigation (mm)`.
    pub units_in_labels: bool,
    /// Longest a sequence may grow through row edits. Longer sequences can
    /// still be edited in place.
    pub max_sequence_rows: usize,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: 4,
            date_formats: vec!["%Y-%m-%d".to_string(), "%d/%m/%Y".to_string()],
            display_date_format: "%Y-%m-%d".to_string(),
            units_in_labels: true,
            max_sequence_rows: 10_000,
        }
    }
}

impl BindingConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sequence_rows == 0 {
            return Err(ConfigError::Invalid(
                "max_sequence_rows must be at least 1".to_string(),
            ));
        }
        if self.date_formats.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one date format is required".to_string(),
            ));
        }
        for format in self.date_formats.iter().chain([&self.display_date_format]) {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(ConfigError::Invalid(format!(
                    "`{format}` is not a valid date format"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = BindingConfig::from_json(r#"{ "max_nesting_depth": 2 }"#).unwrap();
        assert_eq!(config.max_nesting_depth, 2);
        assert_eq!(config.display_date_format, "%Y-%m-%d");
        assert!(config.units_in_labels);
    }

    #[test]
    fn bad_date_formats_are_rejected() {
        let err = BindingConfig::from_json(r#"{ "display_date_format": "%Q" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = BindingConfig::from_json(r#"{ "date_formats": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn sequences_need_room_for_at_least_one_row() {
        let err = BindingConfig::from_json(r#"{ "max_sequence_rows": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(BindingConfig::default().max_sequence_rows, 10_000);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = BindingConfig::from_json("{ max_nesting_depth").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
