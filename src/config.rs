//! Runtime configuration
//!
//! Loaded from a JSON file; every field is optional.
//!
//! ```json
//! {
//!   "strict_fields": true,
//!   "token_bytes": 20,
//!   "log_level": "INFO",
//!   "schema_dir": "/etc/recordgate/record_types"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read(_) => "RG_CONFIG_READ",
            ConfigError::Parse(_) => "RG_CONFIG_PARSE",
            ConfigError::Invalid(_) => "RG_CONFIG_INVALID",
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Registry and repository configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordGateConfig {
    /// Reject fields not declared on the record type (default: true)
    #[serde(default = "default_strict_fields")]
    pub strict_fields: bool,

    /// Random bytes per generated token (default: 20)
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,

    /// Minimum log severity (default: INFO)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,

    /// Directory of extra `*.json` record type descriptors
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,
}

fn default_strict_fields() -> bool {
    true
}

fn default_token_bytes() -> usize {
    20
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for RecordGateConfig {
    fn default() -> Self {
        Self {
            strict_fields: default_strict_fields(),
            token_bytes: default_token_bytes(),
            log_level: default_log_level(),
            schema_dir: None,
        }
    }
}

impl RecordGateConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;

        let config: RecordGateConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// `token_bytes` must be within 8..=64
    fn validate(&self) -> ConfigResult<()> {
        if !(8..=64).contains(&self.token_bytes) {
            return Err(ConfigError::Invalid(format!(
                "token_bytes must be between 8 and 64, got {}",
                self.token_bytes
            )));
        }
        Ok(())
    }

    /// Lenient variant: undeclared fields are ignored during validation
    pub fn lenient() -> Self {
        Self {
            strict_fields: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = RecordGateConfig::default();
        assert!(config.strict_fields);
        assert_eq!(config.token_bytes, 20);
        assert_eq!(config.log_level, Severity::Info);
        assert!(config.schema_dir.is_none());
    }

    #[test]
    fn test_load_applies_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recordgate.json");
        fs::write(&path, r#"{"log_level": "WARN"}"#).unwrap();

        let config = RecordGateConfig::load(&path).unwrap();
        assert_eq!(config.log_level, Severity::Warn);
        assert!(config.strict_fields);
        assert_eq!(config.token_bytes, 20);
    }

    #[test]
    fn test_load_rejects_short_tokens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recordgate.json");
        fs::write(&path, r#"{"token_bytes": 4}"#).unwrap();

        let err = RecordGateConfig::load(&path).unwrap_err();
        assert_eq!(err.code(), "RG_CONFIG_INVALID");
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = RecordGateConfig::load(&temp_dir.path().join("absent.json")).unwrap_err();
        assert_eq!(missing.code(), "RG_CONFIG_READ");

        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{").unwrap();
        let parse = RecordGateConfig::load(&path).unwrap_err();
        assert_eq!(parse.code(), "RG_CONFIG_PARSE");
    }
}
