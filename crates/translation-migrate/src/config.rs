//! Configuration loading and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// Configuration for a [`Migrator`](crate::Migrator) instance.
///
/// The locale configured here is the explicit locale threaded through the
/// data-movement passes; there is no ambient "current locale" global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigratorConfig {
    /// Locale targeted by data-movement passes.
    pub locale: String,

    /// Number of records fetched per batch during data movement.
    pub batch_size: usize,

    /// Whether the translation table gets created_at/updated_at columns.
    pub timestamps: bool,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            batch_size: 1000,
            timestamps: true,
        }
    }
}

impl MigratorConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: MigratorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.locale.is_empty() {
            return Err(MigrateError::Config("locale cannot be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(MigrateError::Config(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MigratorConfig::default();
        assert_eq!(config.locale, "en");
        assert_eq!(config.batch_size, 1000);
        assert!(config.timestamps);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let config = MigratorConfig::from_yaml("locale: de\nbatch_size: 250\n").unwrap();
        assert_eq!(config.locale, "de");
        assert_eq!(config.batch_size, 250);
        assert!(config.timestamps);
    }

    #[test]
    fn test_rejects_empty_locale() {
        let result = MigratorConfig::from_yaml("locale: \"\"\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("locale"));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let result = MigratorConfig::from_yaml("batch_size: 0\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("batch_size"));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(MigratorConfig::from_yaml("locales: [en, de]\n").is_err());
    }
}
