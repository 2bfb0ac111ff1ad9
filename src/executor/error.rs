// Error types for Executor module

use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by `Executor::execute`
///
/// Everything the submitted code does (crashes, timeouts, oversized output, a
/// missing interpreter) is reported inside `ExecutionResult`, not here.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Code is required and must be a non-empty string")]
    SourceMissing,

    #[error("Code too large: {len} characters (limit {max})")]
    SourceTooLarge { len: usize, max: usize },

    #[error("Exercise not found: {0}")]
    ExerciseNotFound(String),

    #[error("Execution failed: {0}")]
    Internal(String),
}

impl ExecutorError {
    /// Conventional HTTP status for the caller's response
    pub fn status_code(&self) -> u16 {
        match self {
            ExecutorError::SourceMissing => 400,
            ExecutorError::SourceTooLarge { .. } => 413,
            ExecutorError::ExerciseNotFound(_) => 404,
            ExecutorError::Internal(_) => 500,
        }
    }

    /// Whether the request itself was at fault
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<StoreError> for ExecutorError {
    fn from(err: StoreError) -> Self {
        ExecutorError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ExecutorError::SourceMissing.status_code(), 400);
        assert_eq!(ExecutorError::SourceTooLarge { len: 2, max: 1 }.status_code(), 413);
        assert_eq!(ExecutorError::ExerciseNotFound("E1".into()).status_code(), 404);
        assert_eq!(ExecutorError::Internal("disk".into()).status_code(), 500);
        assert!(ExecutorError::SourceMissing.is_client_error());
        assert!(!ExecutorError::Internal("disk".into()).is_client_error());
    }

    #[test]
    fn test_internal_message() {
        let err = ExecutorError::Internal("No space left on device".into());
        assert_eq!(err.to_string(), "Execution failed: No space left on device");
    }
}
