use crate::intake::IntakePolicy;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "civic.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Top-level configuration: `civic.toml` first, then environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub intake: IntakeConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

/// Submission timeout and retry budget for new reports.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        let policy = IntakePolicy::default();
        Self {
            timeout_ms: policy.timeout.as_millis() as u64,
            max_retries: policy.max_retries,
        }
    }
}

/// Where issues, departments and news are kept. No path means the built-in
/// sample data held in memory.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, or `civic.toml` in the working directory when present,
    /// and then applies `CIVIC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CIVIC_DB_PATH").filter(|value| !value.trim().is_empty()) {
            self.storage.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup("CIVIC_LOG_LEVEL").filter(|value| !value.trim().is_empty()) {
            self.telemetry.log_level = level;
        }
        if let Some(raw) = lookup("CIVIC_INTAKE_TIMEOUT_MS") {
            self.intake.timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: "CIVIC_INTAKE_TIMEOUT_MS",
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    pub fn intake_policy(&self) -> IntakePolicy {
        IntakePolicy {
            timeout: Duration::from_millis(self.intake.timeout_ms),
            max_retries: self.intake.max_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_configured() {
        let config = AppConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config.intake.timeout_ms, 5_000);
        assert_eq!(config.intake.max_retries, 1);
        assert_eq!(config.storage.db_path, None);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn file_sections_override_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [intake]
            timeout_ms = 250
            max_retries = 3

            [storage]
            db_path = "var/civic.db"
            "#,
        )
        .unwrap();
        let policy = config.intake_policy();
        assert_eq!(policy.timeout, Duration::from_millis(250));
        assert_eq!(policy.max_retries, 3);
        assert_eq!(config.storage.db_path, Some(PathBuf::from("var/civic.db")));
    }

    #[test]
    fn env_overrides_file() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_of(&[
                ("CIVIC_DB_PATH", "/tmp/c.db"),
                ("CIVIC_LOG_LEVEL", "debug"),
                ("CIVIC_INTAKE_TIMEOUT_MS", "100"),
            ]))
            .unwrap();
        assert_eq!(config.storage.db_path, Some(PathBuf::from("/tmp/c.db")));
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.intake.timeout_ms, 100);
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env_of(&[("CIVIC_INTAKE_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = AppConfig::from_file(Path::new("/nonexistent/civic.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
