//! Error types for Spirit Scry.
//!
//! Model invocation failures are deliberately absent: they come back as
//! [`crate::ModelReply`] values tagged with an error outcome.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for core operations
pub type ScryResult<T> = Result<T, ScryError>;

#[derive(Error, Debug)]
pub enum ScryError {
    #[error("profile I/O error at {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("profile document at {} is malformed: {source}", .path.display())]
    MalformedProfile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ScryError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScryError::Persistence {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_setting(key: &str, reason: impl Into<String>) -> Self {
        ScryError::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the error is the caller's fault (bad settings payload) rather than the host's.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ScryError::InvalidSetting { .. })
    }
}
