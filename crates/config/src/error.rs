//! Config loading and saving errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a config file could not be located, read or written
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home or config directory on this platform
    #[error("No platform config directory for castsync")]
    NoConfigDir,

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but holds nothing but whitespace
    #[error("{path} is empty")]
    Empty { path: PathBuf },

    #[error("{path} is not valid config TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cannot encode config as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Refused to save; every failing field is listed
    #[error("Invalid config: {}", join_fields(.0))]
    Invalid(Vec<ValidationError>),

    #[error("Cannot create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot back up config to {path}: {source}")]
    Backup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn join_fields(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One config field that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted field path, e.g. `merge.duplicate_date_tolerance_hours`
    pub field: String,
    pub message: String,
    /// Offending value as text
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Same as [`ValidationError::new`], keeping the rejected value
    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Self::new(field, message)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} (was {})", self.field, self.message, value),
            None => write!(f, "{} {}", self.field, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("app.store_path", "must not be empty");
        assert_eq!(err.to_string(), "app.store_path must not be empty");
    }

    #[test]
    fn test_validation_error_with_value() {
        let err = ValidationError::with_value(
            "merge.duplicate_date_tolerance_hours",
            "must be between 0 and 168",
            200,
        );
        assert_eq!(
            err.to_string(),
            "merge.duplicate_date_tolerance_hours must be between 0 and 168 (was 200)"
        );
    }

    #[test]
    fn test_invalid_lists_every_field() {
        let err = ConfigError::Invalid(vec![
            ValidationError::new("app.store_path", "must not be empty"),
            ValidationError::with_value("merge.duplicate_duration_tolerance_secs", "too small", 0),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid config: app.store_path must not be empty; \
             merge.duplicate_duration_tolerance_secs too small (was 0)"
        );
    }
}
