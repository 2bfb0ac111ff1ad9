// Data types for Executor module

use crate::interpret::TestRunResult;
use serde::{Deserialize, Serialize};

/// One submission to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    #[serde(rename = "code", alias = "sourceText")]
    pub source_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub run_tests: bool,
}

impl ExecutionRequest {
    /// Run the source on its own
    pub fn plain(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            exercise_id: None,
            run_tests: false,
        }
    }

    /// Run the exercise's tests against the source
    pub fn with_tests(source_text: impl Into<String>, exercise_id: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            exercise_id: Some(exercise_id.into()),
            run_tests: true,
        }
    }

    /// Exercise id when this request takes the test path
    pub fn test_exercise(&self) -> Option<&str> {
        if self.run_tests {
            self.exercise_id.as_deref()
        } else {
            None
        }
    }
}

/// Result handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_result: Option<TestRunResult>,
}
