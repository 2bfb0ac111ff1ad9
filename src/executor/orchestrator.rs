// Main Executor implementation

use crate::executor::config::ExecutorConfig;
use crate::executor::error::{ExecutorError, Result};
use crate::executor::types::{ExecutionRequest, ExecutionResult};
use crate::executor::workspace::ScratchWorkspace;
use crate::harness::{self, RUNNER_FILE, STARTER_FILE};
use crate::interpret::{Interpretation, RunMode, interpret};
use crate::runner::{ProcessRunner, RawProcessResult, ScriptRunner};
use crate::sanitizer;
use crate::store::TestScriptSource;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// File holding the learner's code for plain runs
pub const USER_CODE_FILE: &str = "user_code.py";

/// Entry point for running submitted code
pub struct Executor {
    config: ExecutorConfig,
    runner: Arc<dyn ScriptRunner>,
    scripts: Arc<dyn TestScriptSource>,
}

impl Executor {
    /// Executor backed by a `ProcessRunner` built from `config.runner`
    pub fn new(config: ExecutorConfig, scripts: Arc<dyn TestScriptSource>) -> Self {
        let runner = Arc::new(ProcessRunner::new(config.runner.clone()));
        Self::with_runner(config, runner, scripts)
    }

    pub fn with_runner(
        config: ExecutorConfig,
        runner: Arc<dyn ScriptRunner>,
        scripts: Arc<dyn TestScriptSource>,
    ) -> Self {
        debug!(
            scratch_dir = %config.scratch_dir.display(),
            max_source_chars = config.max_source_chars,
            sanitize_test_runs = config.sanitize_test_runs,
            "initializing executor"
        );
        Self {
            config,
            runner,
            scripts,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute one request.
    ///
    /// Validation and unknown exercises fail before anything is spawned. The
    /// scratch workspace is removed on every path before this returns.
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let started = Instant::now();
        self.validate(request)?;

        let workspace = ScratchWorkspace::create(&self.config.scratch_dir)
            .await
            .map_err(|e| ExecutorError::Internal(format!("failed to create workspace: {}", e)))?;

        let outcome = match request.test_exercise() {
            Some(exercise_id) => {
                self.run_tests(&workspace, &request.source_text, exercise_id, started)
                    .await
            }
            None => self.run_plain(&workspace, &request.source_text, started).await,
        };
        workspace.remove().await;

        match &outcome {
            Ok(result) => info!(
                exercise_id = ?request.test_exercise(),
                success = result.success,
                duration_ms = result.execution_time_ms,
                "execution finished"
            ),
            Err(e) => warn!(exercise_id = ?request.test_exercise(), error = %e, "execution rejected"),
        }
        outcome
    }

    fn validate(&self, request: &ExecutionRequest) -> Result<()> {
        if request.source_text.is_empty() {
            return Err(ExecutorError::SourceMissing);
        }
        let len = request.source_text.chars().count();
        if len > self.config.max_source_chars {
            return Err(ExecutorError::SourceTooLarge {
                len,
                max: self.config.max_source_chars,
            });
        }
        Ok(())
    }

    async fn run_plain(
        &self,
        workspace: &ScratchWorkspace,
        source: &str,
        started: Instant,
    ) -> Result<ExecutionResult> {
        if sanitizer::has_main_guard(source) {
            debug!("disabling __main__ guard for plain run");
        }
        let script = write(workspace, USER_CODE_FILE, &sanitizer::sanitize(source)).await?;
        let raw = self.runner.run(&script, workspace.path()).await;
        Ok(assemble(&raw, RunMode::Plain, started))
    }

    async fn run_tests(
        &self,
        workspace: &ScratchWorkspace,
        source: &str,
        exercise_id: &str,
        started: Instant,
    ) -> Result<ExecutionResult> {
        let starter = if self.config.sanitize_test_runs {
            sanitizer::sanitize(source)
        } else {
            source.to_string()
        };
        write(workspace, STARTER_FILE, &starter).await?;

        debug!(exercise_id = %exercise_id, "looking up test script");
        let test_script = self
            .scripts
            .test_script(exercise_id)
            .await?
            .ok_or_else(|| ExecutorError::ExerciseNotFound(exercise_id.to_string()))?;

        let script = write(workspace, RUNNER_FILE, &harness::compose(&test_script)).await?;
        let raw = self.runner.run(&script, workspace.path()).await;
        Ok(assemble(&raw, RunMode::Test, started))
    }
}

async fn write(workspace: &ScratchWorkspace, name: &str, contents: &str) -> Result<std::path::PathBuf> {
    workspace
        .write(name, contents)
        .await
        .map_err(|e| ExecutorError::Internal(format!("failed to write {}: {}", name, e)))
}

/// Build the caller-facing result from a raw process result
fn assemble(raw: &RawProcessResult, mode: RunMode, started: Instant) -> ExecutionResult {
    let errors = raw.errors();
    let interpretation = interpret(&raw.stdout, errors.as_deref(), mode);
    let execution_time_ms = started.elapsed().as_millis() as u64;

    match interpretation {
        Interpretation::Plain { output, errors } => ExecutionResult {
            success: raw.succeeded(),
            output,
            errors,
            execution_time_ms,
            test_result: None,
        },
        Interpretation::Test(test_result) => ExecutionResult {
            success: raw.succeeded() && test_result.passed,
            output: test_result.output.clone(),
            errors,
            execution_time_ms,
            test_result: Some(test_result),
        },
    }
}
