// Harness module - wraps an exercise test script around the learner's module

/// Module name the learner's code is saved under
pub const USER_MODULE: &str = "starter";

/// File holding the learner's code for test runs
pub const STARTER_FILE: &str = "starter.py";

/// File holding the composed wrapper
pub const RUNNER_FILE: &str = "test_runner.py";

/// Printed to stderr when the learner's module cannot be imported
pub const IMPORT_SENTINEL: &str = "IMPORT_ERROR:";

/// Prefix of a structured test-case line on stdout
pub const TEST_CASE_PREFIX: &str = "__TEST_CASE__ ";

const PRELUDE: &str = r#"import sys
import os
import json as _harness_json
sys.path.insert(0, os.path.dirname(os.path.abspath(__file__)))


def report_test_case(name, passed, message=None):
    print("__TEST_CASE__ " + _harness_json.dumps({
        "name": str(name),
        "passed": bool(passed),
        "message": None if message is None else str(message),
    }), flush=True)


try:
    import starter
except ImportError as e:
    print(f"IMPORT_ERROR: Failed to import starter module: {e}", file=sys.stderr)
    sys.exit(1)
except Exception as e:
    print(f"IMPORT_ERROR: Error in starter module: {e}", file=sys.stderr)
    sys.exit(1)

# Exercise tests
"#;

/// Build the wrapper script for `test_source`.
///
/// The wrapper puts its own directory on the module path, imports `starter`
/// (exiting with the import sentinel on any failure) and then runs the test
/// source exactly as given.
pub fn compose(test_source: &str) -> String {
    let mut script = String::with_capacity(PRELUDE.len() + test_source.len() + 1);
    script.push_str(PRELUDE);
    script.push_str(test_source);
    if !test_source.ends_with('\n') {
        script.push('\n');
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_appends_source_verbatim() {
        let test = "import starter\nassert starter.add(2, 3) == 5\nprint(\"OK\")";
        let script = compose(test);

        assert!(script.ends_with("assert starter.add(2, 3) == 5\nprint(\"OK\")\n"));
        assert!(script.contains(test));
    }

    #[test]
    fn test_compose_guards_import() {
        let script = compose("pass\n");

        let import_at = script.find("    import starter").unwrap();
        let tests_at = script.find("pass\n").unwrap();
        assert!(import_at < tests_at);
        assert!(script.contains("except ImportError as e:"));
        assert!(script.contains("except Exception as e:"));
        assert_eq!(script.matches("file=sys.stderr").count(), 2);
        assert_eq!(script.matches("sys.exit(1)").count(), 2);
        assert!(script.contains(IMPORT_SENTINEL));
        assert!(script.contains(TEST_CASE_PREFIX));
        assert!(script.contains(USER_MODULE));
    }

    #[test]
    fn test_compose_keeps_existing_newline() {
        assert!(compose("x = 1\n").ends_with("# Exercise tests\nx = 1\n"));
    }
}
