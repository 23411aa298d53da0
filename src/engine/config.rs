use serde::{Deserialize, Serialize};

use crate::engine::{error::GenError, models::DifficultyLevel};

/// Engine-wide settings.
///
/// Every field has a default, so a partial JSON document (or none at all)
/// is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Difficulty used by [`Orchestrator::generate`](crate::Orchestrator::generate).
    pub default_difficulty: DifficultyLevel,
    /// Stands in for a null variant in seeds and ids.
    pub mixed_variant_label: String,
    /// Archetype reported for legacy generators that don't name one.
    ///
    /// Read when a registry is built (`RegistryBuilder::new`,
    /// `default_registry_with`, `Orchestrator::from_config`), not per call.
    pub legacy_archetype_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_difficulty: DifficultyLevel::Beginner,
            mixed_variant_label: "mixed".to_string(),
            legacy_archetype_label: "default".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, GenError> {
        let config: EngineConfig =
            serde_json::from_str(raw).map_err(|e| GenError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GenError> {
        if self.mixed_variant_label.trim().is_empty() {
            return Err(GenError::InvalidConfig("mixed_variant_label is empty".into()));
        }
        if self.legacy_archetype_label.trim().is_empty() {
            return Err(GenError::InvalidConfig("legacy_archetype_label is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "default_difficulty": "Advanced" }"#).unwrap();
        assert_eq!(config.default_difficulty, DifficultyLevel::Advanced);
        assert_eq!(config.mixed_variant_label, "mixed");
        assert_eq!(config.legacy_archetype_label, "default");
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn bad_input_is_invalid_config() {
        assert_eq!(EngineConfig::from_json_str("[").unwrap_err().code(), "InvalidConfig");
        let blank = r#"{ "mixed_variant_label": " " }"#;
        assert_eq!(EngineConfig::from_json_str(blank).unwrap_err().code(), "InvalidConfig");
    }
}
