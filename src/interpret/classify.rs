// Test output classification

use crate::harness::{IMPORT_SENTINEL, TEST_CASE_PREFIX};
use crate::interpret::types::{ReportedCase, TestCaseOutcome, TestRunResult};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Line printed by a legacy test script once every assertion held
pub const SUCCESS_MARKER: &str = "OK";

pub const IMPORT_MESSAGE: &str = "Failed to import your code. Check for syntax errors.";
pub const SYNTAX_MESSAGE: &str =
    "Syntax error in your code. Please check for typos, missing colons, or incorrect indentation.";
pub const NAME_MESSAGE: &str =
    "Variable or function name not found. Check your spelling and make sure you defined it.";
pub const INDENTATION_MESSAGE: &str =
    "Indentation error. Python requires consistent indentation (use 4 spaces).";
pub const NO_OUTPUT_MESSAGE: &str = "No output from tests. Check your function implementation.";
pub const UNKNOWN_FAILURE_MESSAGE: &str = "Unknown test failure";

const ASSERTION_PREFIX: &str = "AssertionError:";

/// `  File "x.py", line 3, in <module>` traceback preambles
static TRACEBACK_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*File ".*?", line \d+, in .*?(?:\r?\n|$)"#)
        .expect("traceback frame pattern is valid")
});

/// Classify the output of a harnessed test run.
///
/// The first matching rule decides: import failure, structured case lines,
/// success marker, assertion lines, syntax/name/indentation errors, any other
/// stderr, and finally "no output".
pub fn classify(stdout: &str, stderr: Option<&str>) -> TestRunResult {
    let stderr = stderr.map(str::trim).filter(|s| !s.is_empty());
    let (passed, test_cases) = classify_cases(stdout, stderr);

    debug!(
        passed,
        cases = test_cases.len(),
        failed = test_cases.iter().filter(|c| !c.passed).count(),
        "classified test output"
    );

    TestRunResult {
        passed,
        test_cases,
        output: strip_reported_cases(stdout),
        errors: stderr.map(str::to_string),
    }
}

fn classify_cases(stdout: &str, stderr: Option<&str>) -> (bool, Vec<TestCaseOutcome>) {
    if let Some(errors) = stderr {
        if errors.contains(IMPORT_SENTINEL) {
            return (false, vec![TestCaseOutcome::fail("Import Test", IMPORT_MESSAGE)]);
        }
    }

    let mut reported = reported_cases(stdout);
    if !reported.is_empty() {
        if let Some(errors) = stderr {
            reported.push(TestCaseOutcome::fail("Execution", clean_traceback(errors)));
        }
        let passed = reported.iter().all(|case| case.passed);
        return (passed, reported);
    }

    let Some(errors) = stderr else {
        if has_success_marker(stdout) {
            return (true, vec![TestCaseOutcome::pass("All Tests")]);
        }
        return (false, vec![TestCaseOutcome::fail("Execution", NO_OUTPUT_MESSAGE)]);
    };

    if errors.contains(ASSERTION_PREFIX) {
        return (false, assertion_cases(errors));
    }

    let case = if errors.contains("SyntaxError:") {
        TestCaseOutcome::fail("Syntax Check", SYNTAX_MESSAGE)
    } else if errors.contains("NameError:") {
        TestCaseOutcome::fail("Variable Check", NAME_MESSAGE)
    } else if errors.contains("IndentationError:") {
        TestCaseOutcome::fail("Indentation Check", INDENTATION_MESSAGE)
    } else {
        TestCaseOutcome::fail("Execution", clean_traceback(errors))
    };
    (false, vec![case])
}

fn has_success_marker(stdout: &str) -> bool {
    stdout.lines().any(|line| line.trim() == SUCCESS_MARKER)
}

/// One failing case per `AssertionError:` line
fn assertion_cases(errors: &str) -> Vec<TestCaseOutcome> {
    errors
        .lines()
        .filter_map(|line| {
            let at = line.find(ASSERTION_PREFIX)?;
            let message = line[at + ASSERTION_PREFIX.len()..].trim();
            Some(TestCaseOutcome::fail("Test Case", message))
        })
        .collect()
}

/// Parse `__TEST_CASE__ {json}` lines, skipping malformed ones
fn reported_cases(stdout: &str) -> Vec<TestCaseOutcome> {
    stdout
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix(TEST_CASE_PREFIX))
        .filter_map(|payload| match serde_json::from_str::<ReportedCase>(payload) {
            Ok(case) => Some(TestCaseOutcome::from(case)),
            Err(e) => {
                debug!(error = %e, "ignoring malformed test case line");
                None
            }
        })
        .collect()
}

/// `stdout` without the structured test-case lines
pub fn strip_reported_cases(stdout: &str) -> String {
    stdout
        .lines()
        .filter(|line| !line.trim_start().starts_with(TEST_CASE_PREFIX))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip traceback file/line preambles and blank lines
pub fn clean_traceback(errors: &str) -> String {
    let stripped = TRACEBACK_FRAME.replace_all(errors, "");
    let cleaned = stripped
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.is_empty() {
        UNKNOWN_FAILURE_MESSAGE.to_string()
    } else {
        cleaned
    }
}
