//! Compiler configuration.
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! approximate_fraction = 0.1
//! max_chain_depth = 4
//! reference_time = "2024-01-01T00:00:00Z"
//! ```

use std::path::Path;

use octofhir_core::FhirDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCompilerConfig {
    /// Widening fraction for the `ap` comparator.
    pub approximate_fraction: f64,
    /// Maximum number of reference hops in a chained key.
    pub max_chain_depth: usize,
    /// Instant treated as "now" by `ap` on dates; unset means the system clock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_time: Option<FhirDateTime>,
}

impl Default for SearchCompilerConfig {
    fn default() -> Self {
        Self {
            approximate_fraction: 0.1,
            max_chain_depth: 4,
            reference_time: None,
        }
    }
}

impl SearchCompilerConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded search compiler config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.approximate_fraction.is_finite()
            || !(0.0..=1.0).contains(&self.approximate_fraction)
        {
            return Err(ConfigError::Validation(format!(
                "approximate_fraction must be between 0 and 1, got {}",
                self.approximate_fraction
            )));
        }
        if self.max_chain_depth == 0 {
            return Err(ConfigError::Validation(
                "max_chain_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_reference_time(mut self, reference_time: FhirDateTime) -> Self {
        self.reference_time = Some(reference_time);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use time::macros::datetime;

    #[test]
    fn test_defaults() {
        let config = SearchCompilerConfig::from_toml_str("").unwrap();
        assert_eq!(config, SearchCompilerConfig::default());
        assert_eq!(config.approximate_fraction, 0.1);
        assert_eq!(config.max_chain_depth, 4);
        assert!(config.reference_time.is_none());
    }

    #[test]
    fn test_parse_all_keys() {
        let config = SearchCompilerConfig::from_toml_str(
            r#"
            approximate_fraction = 0.25
            max_chain_depth = 2
            reference_time = "2024-06-01T12:00:00Z"
            "#,
        )
        .unwrap();
        assert_eq!(config.approximate_fraction, 0.25);
        assert_eq!(config.max_chain_depth, 2);
        assert_eq!(
            config.reference_time,
            Some(FhirDateTime::new(datetime!(2024-06-01 12:00 UTC)))
        );
    }

    #[test]
    fn test_validation() {
        let err = SearchCompilerConfig::from_toml_str("approximate_fraction = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = SearchCompilerConfig::from_toml_str("max_chain_depth = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = SearchCompilerConfig::from_toml_str("max_chain_depth = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = SearchCompilerConfig::from_toml_str("reference_time = \"yesterday\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_chain_depth = 7").unwrap();

        let config = SearchCompilerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_chain_depth, 7);

        let err = SearchCompilerConfig::from_file("/nonexistent/search.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
