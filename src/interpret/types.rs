// Data types for Interpret module

use serde::{Deserialize, Serialize};

/// Outcome of one named test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TestCaseOutcome {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error_message: None,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error_message: Some(message.into()),
        }
    }
}

/// Aggregated result of a test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunResult {
    pub passed: bool,
    pub test_cases: Vec<TestCaseOutcome>,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl TestRunResult {
    pub fn failed_cases(&self) -> impl Iterator<Item = &TestCaseOutcome> {
        self.test_cases.iter().filter(|case| !case.passed)
    }
}

/// Which kind of run produced the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Plain,
    Test,
}

/// Interpreted process output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    Plain {
        output: String,
        errors: Option<String>,
    },
    Test(TestRunResult),
}

/// One `__TEST_CASE__` line as emitted by the harness helper
#[derive(Debug, Deserialize)]
pub(crate) struct ReportedCase {
    pub name: String,
    pub passed: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<ReportedCase> for TestCaseOutcome {
    fn from(case: ReportedCase) -> Self {
        Self {
            name: case.name,
            passed: case.passed,
            error_message: if case.passed { None } else { case.message },
        }
    }
}
