//! Engine configuration.
//!
//! # Responsibility
//! - Describe database location, logging and calendar-day settings.
//! - Load settings from JSON and `HABITXP_*` environment overrides.
//!
//! # Invariants
//! - A validated config always yields a usable UTC offset and log level.
//! - Missing keys fall back to defaults; unknown keys are rejected.

use crate::logging::{default_log_level, normalize_level};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "HABITXP_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "HABITXP_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "HABITXP_LOG_DIR";
pub const ENV_UTC_OFFSET_MINUTES: &str = "HABITXP_UTC_OFFSET_MINUTES";

const DEFAULT_DB_FILE_NAME: &str = "habitxp.sqlite3";
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    InvalidValue { key: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidValue { key, reason } => write!(f, "invalid `{key}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// SQLite file path, or `:memory:`.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
    /// Offset applied to UTC to find the user's calendar day.
    pub utc_offset_minutes: i32,
    /// Seed the built-in achievement catalogue into an empty database.
    pub seed_default_catalogue: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            utc_offset_minutes: 0,
            seed_default_catalogue: true,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Loads an optional file, then applies process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(std::env::vars())
    }

    /// Applies `HABITXP_*` overrides from `vars` and re-validates.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let value = value.into();
            match key.as_ref() {
                ENV_DB_PATH => self.db_path = PathBuf::from(value),
                ENV_LOG_LEVEL => self.log_level = value,
                ENV_LOG_DIR => {
                    self.log_dir = if value.trim().is_empty() {
                        None
                    } else {
                        Some(PathBuf::from(value))
                    }
                }
                ENV_UTC_OFFSET_MINUTES => {
                    self.utc_offset_minutes =
                        value.trim().parse().map_err(|err| ConfigError::InvalidValue {
                            key: "utc_offset_minutes",
                            reason: format!("`{value}` is not an integer: {err}"),
                        })?;
                }
                _ => {}
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "db_path",
                reason: "must not be empty".to_string(),
            });
        }
        normalize_level(&self.log_level).map_err(|err| ConfigError::InvalidValue {
            key: "log_level",
            reason: err.to_string(),
        })?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: "log_dir",
                    reason: format!("must be absolute, got `{}`", dir.display()),
                });
            }
        }
        self.utc_offset()?;
        Ok(())
    }

    /// UTC offset used to derive calendar days.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: "utc_offset_minutes",
            reason: format!(
                "{} is outside +/-{MAX_UTC_OFFSET_MINUTES}",
                self.utc_offset_minutes
            ),
        };
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(invalid());
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_UTC_OFFSET_MINUTES};
    use std::path::PathBuf;

    #[test]
    fn empty_json_uses_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.seed_default_catalogue);
    }

    #[test]
    fn json_fields_are_applied() {
        let config = EngineConfig::from_json_str(
            r#"{"db_path": ":memory:", "log_level": "warn", "utc_offset_minutes": 180}"#,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from(":memory:"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), 180 * 60);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = EngineConfig::from_json_str(r#"{"dbpath": "x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_win_and_are_validated() {
        let config = EngineConfig::default()
            .with_overrides([
                (ENV_DB_PATH, "/tmp/habits.sqlite3"),
                (ENV_UTC_OFFSET_MINUTES, "-300"),
                (ENV_LOG_DIR, ""),
                ("UNRELATED", "ignored"),
            ])
            .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/habits.sqlite3"));
        assert_eq!(config.utc_offset_minutes, -300);
        assert_eq!(config.log_dir, None);

        let err = EngineConfig::default()
            .with_overrides([(ENV_UTC_OFFSET_MINUTES, "abc")])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "utc_offset_minutes",
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_offset_and_relative_log_dir_fail() {
        let err = EngineConfig::from_json_str(r#"{"utc_offset_minutes": 2000}"#).unwrap_err();
        assert!(err.to_string().contains("utc_offset_minutes"));

        let err = EngineConfig::from_json_str(r#"{"log_dir": "logs"}"#).unwrap_err();
        assert!(err.to_string().contains("log_dir"));
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habitxp.json");
        std::fs::write(&path, r#"{"log_level": "debug"}"#).unwrap();

        let config = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");

        let missing = EngineConfig::from_json_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
