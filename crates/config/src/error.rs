//! Config crate errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `origin` is the file path, or `<string>` for in-memory input
    #[error("malformed config in {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },

    #[error("cannot encode config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{} invalid config value(s): {}", .0.len(), join(.0))]
    Invalid(Vec<ValidationError>),
}

fn join(issues: &[ValidationError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One rejected field, addressed as `section.field`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub problem: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_lists_every_issue() {
        let err = ConfigError::Invalid(vec![
            ValidationError::new("playback.position_refresh_ms", "got 0, allowed 100..=10000"),
            ValidationError::new("app.log_level", "unknown level"),
        ]);
        assert_eq!(
            err.to_string(),
            "2 invalid config value(s): playback.position_refresh_ms: got 0, allowed 100..=10000; \
             app.log_level: unknown level"
        );
    }
}
