// Integration tests for Executor module
// Plain runs use /bin/sh as the interpreter; Python end-to-end tests skip without python3

use async_trait::async_trait;
use pyrunner::runner::{ProcessOutcome, RawProcessResult, ScriptRunner};
use pyrunner::{
    ExecutionRequest, Executor, ExecutorConfig, ExecutorError, MemoryStore, RunnerConfig,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    });
}

const ADD_TEST: &str = "assert starter.add(2, 3) == 5, \"add(2, 3) should be 5\"\nprint(\"OK\")\n";

fn exercises() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new().with("add", ADD_TEST))
}

fn config(scratch: &TempDir, runner: RunnerConfig) -> ExecutorConfig {
    ExecutorConfig {
        runner,
        scratch_dir: scratch.path().to_path_buf(),
        ..Default::default()
    }
}

fn sh_runner() -> RunnerConfig {
    RunnerConfig {
        timeout_ms: 2_000,
        max_output_bytes: 4096,
        kill_grace_ms: 100,
        interpreter: "/bin/sh".to_string(),
        interpreter_args: Vec::new(),
    }
}

/// Files a stub run saw in its workspace
#[derive(Debug, Clone)]
struct Observed {
    script: PathBuf,
    working_dir: PathBuf,
    files: Vec<(String, String)>,
}

/// Records what it was asked to run and returns a canned result
struct StubRunner {
    result: RawProcessResult,
    observed: Mutex<Vec<Observed>>,
}

impl StubRunner {
    fn new(stdout: &str, stderr: &str, exit_code: i32) -> Arc<Self> {
        Arc::new(Self {
            result: RawProcessResult {
                outcome: ProcessOutcome::Exited,
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                timed_out: false,
                truncated: false,
                spawn_error: None,
                notice: None,
                duration_ms: 1,
            },
            observed: Mutex::new(Vec::new()),
        })
    }

    fn observed(&self) -> Vec<Observed> {
        self.observed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptRunner for StubRunner {
    async fn run(&self, script: &Path, working_dir: &Path) -> RawProcessResult {
        let mut files: Vec<(String, String)> = std::fs::read_dir(working_dir)
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                let name = entry.file_name().to_string_lossy().into_owned();
                let contents = std::fs::read_to_string(entry.path()).unwrap();
                (name, contents)
            })
            .collect();
        files.sort();
        self.observed.lock().unwrap().push(Observed {
            script: script.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
            files,
        });
        self.result.clone()
    }
}

fn scratch_is_empty(scratch: &TempDir) -> bool {
    std::fs::read_dir(scratch.path()).unwrap().next().is_none()
}

fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    /// Plain run writes sanitized user_code.py and cleans up afterwards
    #[tokio::test]
    async fn test_plain_run_layout() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let stub = StubRunner::new("  hi\n", "", 0);
        let executor = Executor::with_runner(config(&scratch, sh_runner()), stub.clone(), exercises());

        let source = "print('hi')\nif __name__ == \"__main__\":\n    input()\n";
        let result = assert_ok!(executor.execute(&ExecutionRequest::plain(source)).await);

        assert!(result.success);
        assert_eq!(result.output, "hi");
        assert_eq!(result.errors, None);
        assert!(result.test_result.is_none());

        let observed = stub.observed();
        assert_eq!(observed.len(), 1);
        assert_eq!(observed[0].script, observed[0].working_dir.join("user_code.py"));
        assert_eq!(observed[0].files.len(), 1);
        let (name, contents) = &observed[0].files[0];
        assert_eq!(name, "user_code.py");
        assert!(contents.contains("#     input()"));

        assert!(!observed[0].working_dir.exists());
        assert!(scratch_is_empty(&scratch));
    }

    /// Test run writes the unsanitized starter plus the composed harness
    #[tokio::test]
    async fn test_test_run_layout() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let stub = StubRunner::new("OK", "", 0);
        let executor = Executor::with_runner(config(&scratch, sh_runner()), stub.clone(), exercises());

        let source = "def add(a, b):\n    return a + b\n\nif __name__ == '__main__':\n    print(add(1, 1))\n";
        let result = assert_ok!(executor.execute(&ExecutionRequest::with_tests(source, "add")).await);

        assert!(result.success);
        let test_result = result.test_result.unwrap();
        assert!(test_result.passed);
        assert_eq!(test_result.test_cases[0].name, "All Tests");

        let observed = stub.observed();
        assert_eq!(observed.len(), 1);
        assert_eq!(observed[0].script, observed[0].working_dir.join("test_runner.py"));
        let names: Vec<&str> = observed[0].files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["starter.py", "test_runner.py"]);
        assert_eq!(observed[0].files[0].1, source);
        assert!(observed[0].files[1].1.contains("import starter"));
        assert!(observed[0].files[1].1.ends_with(ADD_TEST));

        assert!(scratch_is_empty(&scratch));
    }

    /// The sanitize_test_runs switch also rewrites the starter module
    #[tokio::test]
    async fn test_sanitize_test_runs_switch() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let stub = StubRunner::new("OK", "", 0);
        let mut cfg = config(&scratch, sh_runner());
        cfg.sanitize_test_runs = true;
        let executor = Executor::with_runner(cfg, stub.clone(), exercises());

        let source = "def add(a, b):\n    return a + b\nif __name__ == '__main__':\n    input()\n";
        assert_ok!(executor.execute(&ExecutionRequest::with_tests(source, "add")).await);

        let observed = stub.observed();
        assert_ne!(observed[0].files[0].1, source);
        assert!(observed[0].files[0].1.contains("#     input()"));
    }

    /// Failing assertions come back as data with one case per assertion
    #[tokio::test]
    async fn test_test_run_assertion_failure() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let stub = StubRunner::new(
            "",
            "Traceback (most recent call last):\n  File \"test_runner.py\", line 20, in <module>\nAssertionError: add(2, 3) should be 5\n",
            1,
        );
        let executor = Executor::with_runner(config(&scratch, sh_runner()), stub, exercises());

        let result = assert_ok!(
            executor
                .execute(&ExecutionRequest::with_tests("def add(a, b):\n    return a - b\n", "add"))
                .await
        );

        assert!(!result.success);
        let test_result = result.test_result.unwrap();
        assert!(!test_result.passed);
        assert_eq!(test_result.test_cases.len(), 1);
        assert_eq!(test_result.test_cases[0].name, "Test Case");
        assert_eq!(
            test_result.test_cases[0].error_message.as_deref(),
            Some("add(2, 3) should be 5")
        );
        assert!(scratch_is_empty(&scratch));
    }

    /// Validation failures spawn nothing and leave nothing behind
    #[tokio::test]
    async fn test_validation() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let stub = StubRunner::new("", "", 0);
        let mut cfg = config(&scratch, sh_runner());
        cfg.max_source_chars = 10;
        let executor = Executor::with_runner(cfg, stub.clone(), exercises());

        let err = assert_err!(executor.execute(&ExecutionRequest::plain("")).await);
        assert!(matches!(err, ExecutorError::SourceMissing));
        assert_eq!(err.status_code(), 400);

        let err = assert_err!(executor.execute(&ExecutionRequest::plain("x = 12345678")).await);
        assert!(matches!(err, ExecutorError::SourceTooLarge { len: 12, max: 10 }));
        assert_eq!(err.status_code(), 413);

        // Ten characters, more than ten bytes
        assert_ok!(executor.execute(&ExecutionRequest::plain("ééééééééé\n")).await);

        assert_eq!(stub.observed().len(), 1);
        assert!(scratch_is_empty(&scratch));
    }

    /// Unknown exercises are a distinct error and nothing is spawned
    #[tokio::test]
    async fn test_exercise_not_found() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let stub = StubRunner::new("OK", "", 0);
        let executor = Executor::with_runner(config(&scratch, sh_runner()), stub.clone(), exercises());

        let err = assert_err!(
            executor
                .execute(&ExecutionRequest::with_tests("x = 1", "missing"))
                .await
        );
        assert!(matches!(&err, ExecutorError::ExerciseNotFound(id) if id == "missing"));
        assert_eq!(err.status_code(), 404);
        assert!(stub.observed().is_empty());
        assert!(scratch_is_empty(&scratch));
    }

    /// run_tests without an exercise id takes the plain path
    #[tokio::test]
    async fn test_run_tests_without_exercise() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let stub = StubRunner::new("1", "", 0);
        let executor = Executor::with_runner(config(&scratch, sh_runner()), stub.clone(), exercises());

        let request = ExecutionRequest {
            source_text: "print(1)".to_string(),
            exercise_id: None,
            run_tests: true,
        };
        let result = assert_ok!(executor.execute(&request).await);

        assert!(result.test_result.is_none());
        assert!(stub.observed()[0].script.ends_with("user_code.py"));
    }

    /// Real processes: non-zero exit and stderr surface as data
    #[cfg(unix)]
    #[tokio::test]
    async fn test_real_process_failure_is_data() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let executor = Executor::new(config(&scratch, sh_runner()), exercises());

        let result = assert_ok!(
            executor
                .execute(&ExecutionRequest::plain("echo partial\necho broken >&2\nexit 1\n"))
                .await
        );

        assert!(!result.success);
        assert_eq!(result.output, "partial");
        assert_eq!(result.errors.as_deref(), Some("broken"));
        assert!(scratch_is_empty(&scratch));
    }

    /// Real processes: a timeout is a failed result and the workspace is still removed
    #[cfg(unix)]
    #[tokio::test]
    async fn test_real_process_timeout_cleanup() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let mut runner = sh_runner();
        runner.timeout_ms = 300;
        let executor = Executor::new(config(&scratch, runner), exercises());

        let result = assert_ok!(
            executor
                .execute(&ExecutionRequest::plain("while true; do :; done\n"))
                .await
        );

        assert!(!result.success);
        assert!(result.errors.as_deref().unwrap().contains("timed out"));
        assert!(scratch_is_empty(&scratch));
    }

    /// A missing interpreter is a failed result, not an error
    #[tokio::test]
    async fn test_interpreter_missing_is_data() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let mut runner = sh_runner();
        runner.interpreter = "pyrunner-no-such-interpreter".to_string();
        let executor = Executor::new(config(&scratch, runner), exercises());

        let result = assert_ok!(executor.execute(&ExecutionRequest::plain("print(1)")).await);

        assert!(!result.success);
        assert!(result.errors.as_deref().unwrap().starts_with("Python not found"));
        assert!(scratch_is_empty(&scratch));
    }

    /// Concurrent executions get separate workspaces and all clean up
    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_executions() {
        init_tracing();

        let scratch = tempfile::tempdir().unwrap();
        let executor = Arc::new(Executor::new(config(&scratch, sh_runner()), exercises()));

        let requests: Vec<ExecutionRequest> = (0..8)
            .map(|i| ExecutionRequest::plain(format!("echo run-{}\n", i)))
            .collect();
        let results =
            futures::future::join_all(requests.iter().map(|request| executor.execute(request)))
                .await;

        for (i, result) in results.into_iter().enumerate() {
            let result = assert_ok!(result);
            assert!(result.success);
            assert_eq!(result.output, format!("run-{}", i));
        }
        assert!(scratch_is_empty(&scratch));
    }

    /// End-to-end with a real interpreter
    #[tokio::test]
    async fn test_python_end_to_end() {
        init_tracing();

        if !python_available() {
            eprintln!("python3 not installed, skipping");
            return;
        }

        let scratch = tempfile::tempdir().unwrap();
        let executor = Executor::new(config(&scratch, RunnerConfig::extended()), exercises());

        let result = assert_ok!(
            executor
                .execute(&ExecutionRequest::plain("print(\"Hello, World!\")"))
                .await
        );
        assert!(result.success);
        assert_eq!(result.output, "Hello, World!");
        assert_eq!(result.errors, None);

        let result = assert_ok!(
            executor
                .execute(&ExecutionRequest::with_tests(
                    "def add(a, b):\n    return a + b\n",
                    "add"
                ))
                .await
        );
        assert!(result.success);
        assert!(result.test_result.unwrap().passed);

        let result = assert_ok!(
            executor
                .execute(&ExecutionRequest::with_tests(
                    "def add(a, b):\n    return a - b\n",
                    "add"
                ))
                .await
        );
        assert!(!result.success);
        let test_result = result.test_result.unwrap();
        assert!(!test_result.passed);
        assert_eq!(test_result.test_cases.len(), 1);
        assert_eq!(test_result.test_cases[0].name, "Test Case");
        assert_eq!(
            test_result.test_cases[0].error_message.as_deref(),
            Some("add(2, 3) should be 5")
        );

        let result = assert_ok!(
            executor
                .execute(&ExecutionRequest::with_tests("def add(a, b)\n    return a\n", "add"))
                .await
        );
        let test_result = result.test_result.unwrap();
        assert_eq!(test_result.test_cases[0].name, "Import Test");

        let result = assert_ok!(executor.execute(&ExecutionRequest::plain("input()\n")).await);
        assert!(!result.success);
        assert!(result.errors.unwrap().contains("EOFError"));

        assert!(scratch_is_empty(&scratch));
    }

    /// A guarded banner with a multi-line string still leaves an importable module
    #[tokio::test]
    async fn test_python_guard_with_banner() {
        init_tracing();

        if !python_available() {
            eprintln!("python3 not installed, skipping");
            return;
        }

        let scratch = tempfile::tempdir().unwrap();
        let executor = Executor::new(config(&scratch, RunnerConfig::extended()), exercises());

        let source = "def greet():\n    return 'hi'\n\nprint(greet())\n\
                      if __name__ == \"__main__\":\n    print(\"\"\"\nWelcome!\n\"\"\")\n\
                      # ask for a name\n    name = input()\n";
        let result = assert_ok!(executor.execute(&ExecutionRequest::plain(source)).await);

        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.output, "hi");
        assert_eq!(result.errors, None);
    }

    /// Structured test-case lines from the harness helper
    #[tokio::test]
    async fn test_python_structured_cases() {
        init_tracing();

        if !python_available() {
            eprintln!("python3 not installed, skipping");
            return;
        }

        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new().with(
            "square",
            "report_test_case('square(2)', starter.square(2) == 4)\n\
             report_test_case('square(3)', starter.square(3) == 9, 'expected 9')\n",
        ));
        let executor = Executor::new(config(&scratch, RunnerConfig::extended()), store);

        let result = assert_ok!(
            executor
                .execute(&ExecutionRequest::with_tests(
                    "def square(x):\n    return x * 2\n",
                    "square"
                ))
                .await
        );

        assert!(!result.success);
        let test_result = result.test_result.unwrap();
        assert_eq!(test_result.test_cases.len(), 2);
        assert!(test_result.test_cases[0].passed);
        assert!(!test_result.test_cases[1].passed);
        assert_eq!(
            test_result.test_cases[1].error_message.as_deref(),
            Some("expected 9")
        );
        assert!(!result.output.contains("__TEST_CASE__"));
    }
}
