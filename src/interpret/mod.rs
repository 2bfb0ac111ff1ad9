// Interpret module - turns raw process output into results

pub mod classify;
pub mod types;

pub use classify::{SUCCESS_MARKER, classify, clean_traceback, strip_reported_cases};
pub use types::{Interpretation, RunMode, TestCaseOutcome, TestRunResult};

/// Interpret trimmed process output for the given run mode.
///
/// Plain runs pass output through untouched; test runs are classified into
/// named test cases.
pub fn interpret(stdout: &str, stderr: Option<&str>, mode: RunMode) -> Interpretation {
    match mode {
        RunMode::Plain => Interpretation::Plain {
            output: stdout.trim().to_string(),
            errors: stderr
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        },
        RunMode::Test => Interpretation::Test(classify(stdout.trim(), stderr)),
    }
}
