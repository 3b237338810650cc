//! Adapter settings.
//!
//! Settings are read from TOML and merged with environment variables prefixed
//! with `SPOTIM_ADAPTER__`. For example, `SPOTIM_ADAPTER__ADAPTERS__SPOTIM__ENDPOINT`
//! overrides `adapters.spotim.endpoint`.

use std::collections::HashMap;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use validator::Validate;

use crate::error::AdapterError;

pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "SPOTIM_ADAPTER";
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";

/// Implemented by every per-adapter configuration table.
pub trait AdapterConfig: DeserializeOwned + Validate {
    fn is_enabled(&self) -> bool;
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Raw `[adapters.<id>]` tables, decoded lazily by `adapter_config`.
    #[serde(default)]
    pub adapters: HashMap<String, Json>,
}

impl Settings {
    /// Parse settings from a TOML string, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or cannot be merged with the
    /// environment.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<AdapterError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR)
            .try_parsing(true);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(AdapterError::Configuration {
                message: "Failed to build configuration".to_string(),
            })?;

        config
            .try_deserialize()
            .change_context(AdapterError::Configuration {
                message: "Failed to deserialize configuration".to_string(),
            })
    }

    /// Decode and validate the `[adapters.<id>]` table.
    ///
    /// Returns `Ok(None)` when the table is absent or the adapter is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not match `T` or fails validation.
    pub fn adapter_config<T: AdapterConfig>(
        &self,
        id: &str,
    ) -> Result<Option<T>, Report<AdapterError>> {
        let Some(raw) = self.adapters.get(id) else {
            return Ok(None);
        };

        let config: T =
            serde_json::from_value(raw.clone()).change_context(AdapterError::Configuration {
                message: format!("Failed to decode adapters.{id}"),
            })?;

        config.validate().map_err(|e| {
            Report::new(AdapterError::InvalidSettings {
                message: format!("adapters.{id}: {e}"),
            })
        })?;

        Ok(config.is_enabled().then_some(config))
    }

    /// Replace the `[adapters.<id>]` table.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn insert_adapter_config<T: Serialize>(
        &mut self,
        id: &str,
        value: &T,
    ) -> Result<(), Report<AdapterError>> {
        let json = serde_json::to_value(value).change_context(AdapterError::Configuration {
            message: format!("Failed to encode adapters.{id}"),
        })?;
        self.adapters.insert(id.to_string(), json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::spotim::SpotimConfig;
    use crate::test_support::tests::{without_overrides, ENDPOINT_VAR, TTL_VAR};
    use serde_json::json;

    #[test]
    fn test_settings_from_valid_toml() {
        let toml_str = r#"
            [adapters.spotim]
            enabled = true
            bidder_code = "spotim"
            endpoint = "https://hb.example.com/"
            ttl_seconds = 300
            "#;

        let settings =
            without_overrides(|| Settings::from_toml(toml_str)).expect("should parse settings");
        let config = settings
            .adapter_config::<SpotimConfig>("spotim")
            .expect("should decode config")
            .expect("should be enabled");

        assert_eq!(config.endpoint, "https://hb.example.com/");
        assert_eq!(config.ttl_seconds, 300);
        assert_eq!(config.bidder_code, "spotim");
    }

    #[test]
    fn test_settings_empty_toml() {
        let settings =
            without_overrides(|| Settings::from_toml("")).expect("should accept empty TOML");
        assert!(settings.adapters.is_empty());
        assert!(settings
            .adapter_config::<SpotimConfig>("spotim")
            .expect("should not fail on missing table")
            .is_none());
    }

    #[test]
    fn test_settings_invalid_toml_syntax() {
        let toml_str = r#"
            [adapters.spotim
            enabled = true
            "#;

        let settings = Settings::from_toml(toml_str);
        assert!(settings.is_err(), "Should fail with invalid TOML syntax");
    }

    #[test]
    fn test_adapter_config_rejects_invalid_endpoint() {
        let toml_str = r#"
            [adapters.spotim]
            endpoint = "not a url"
            "#;

        let settings =
            without_overrides(|| Settings::from_toml(toml_str)).expect("should parse settings");
        let err = settings
            .adapter_config::<SpotimConfig>("spotim")
            .expect_err("should reject invalid endpoint");
        assert!(matches!(
            err.current_context(),
            AdapterError::InvalidSettings { .. }
        ));
    }

    #[test]
    fn test_adapter_config_rejects_wrong_types() {
        let toml_str = r#"
            [adapters.spotim]
            ttl_seconds = "forever"
            "#;

        let settings =
            without_overrides(|| Settings::from_toml(toml_str)).expect("should parse settings");
        let err = settings
            .adapter_config::<SpotimConfig>("spotim")
            .expect_err("should reject non-numeric ttl");
        assert!(matches!(
            err.current_context(),
            AdapterError::Configuration { .. }
        ));
    }

    #[test]
    fn test_insert_adapter_config_round_trips() {
        let mut settings = Settings::default();
        settings
            .insert_adapter_config(
                "spotim",
                &json!({ "enabled": true, "endpoint": "https://hb.example.org/" }),
            )
            .expect("should insert config");

        let config = settings
            .adapter_config::<SpotimConfig>("spotim")
            .expect("should decode config")
            .expect("should be enabled");
        assert_eq!(config.endpoint, "https://hb.example.org/");
    }

    #[test]
    fn test_set_env() {
        let toml_str = r#"
            [adapters.spotim]
            enabled = true
            "#;

        temp_env::with_var(
            ENDPOINT_VAR,
            Some("https://hb.override.com/"),
            || {
                let settings = Settings::from_toml(toml_str).expect("should parse settings");
                let config = settings
                    .adapter_config::<SpotimConfig>("spotim")
                    .expect("should decode config")
                    .expect("should be enabled");
                assert_eq!(config.endpoint, "https://hb.override.com/");
            },
        );
    }

    #[test]
    fn test_override_env_parses_numbers() {
        let toml_str = r#"
            [adapters.spotim]
            enabled = true
            ttl_seconds = 400
            "#;

        temp_env::with_var(
            TTL_VAR,
            Some("120"),
            || {
                let settings = Settings::from_toml(toml_str).expect("should parse settings");
                let config = settings
                    .adapter_config::<SpotimConfig>("spotim")
                    .expect("should decode config")
                    .expect("should be enabled");
                assert_eq!(config.ttl_seconds, 120);
            },
        );
    }
}
