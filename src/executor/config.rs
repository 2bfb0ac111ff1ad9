// Executor configuration

use crate::executor::error::ConfigError;
use crate::runner::RunnerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Executor configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Process limits and interpreter
    pub runner: RunnerConfig,
    /// Parent directory of per-request scratch workspaces
    pub scratch_dir: PathBuf,
    /// Largest accepted source, in characters
    pub max_source_chars: usize,
    /// Root of the exercise directory store
    pub exercises_dir: PathBuf,
    /// Also disable `__main__` guards in the learner's module for test runs
    pub sanitize_test_runs: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            runner: RunnerConfig::default(),
            scratch_dir: std::env::temp_dir().join("pyrunner"),
            max_source_chars: 50_000,
            exercises_dir: dirs::home_dir()
                .map(|p| p.join(".pyrunner").join("exercises"))
                .unwrap_or_else(|| PathBuf::from(".pyrunner/exercises")),
            sanitize_test_runs: false,
        }
    }
}

/// Parse a variable from `lookup`, logging a warning if the value is present but invalid.
fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> T {
    match lookup(name) {
        Some(v) => match v.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(var = name, value = %v, "Invalid env var value, using default");
                default
            }
        },
        None => default,
    }
}

impl ExecutorConfig {
    /// Defaults overridden by `PYRUNNER_*` environment variables (and `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::default().with_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file; keys left out keep their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded executor config file");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Optional file first, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `PYRUNNER_*` overrides read through `lookup`
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let runner = &mut self.runner;
        runner.timeout_ms = parse_var(&lookup, "PYRUNNER_TIMEOUT_MS", runner.timeout_ms);
        runner.max_output_bytes =
            parse_var(&lookup, "PYRUNNER_MAX_OUTPUT_BYTES", runner.max_output_bytes);
        runner.kill_grace_ms = parse_var(&lookup, "PYRUNNER_KILL_GRACE_MS", runner.kill_grace_ms);
        if let Some(interpreter) = lookup("PYRUNNER_INTERPRETER") {
            runner.interpreter = interpreter;
        }

        self.max_source_chars =
            parse_var(&lookup, "PYRUNNER_MAX_SOURCE_CHARS", self.max_source_chars);
        self.sanitize_test_runs =
            parse_var(&lookup, "PYRUNNER_SANITIZE_TEST_RUNS", self.sanitize_test_runs);
        if let Some(dir) = lookup("PYRUNNER_SCRATCH_DIR") {
            self.scratch_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("PYRUNNER_EXERCISES_DIR") {
            self.exercises_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner.timeout_ms == 0 {
            return Err(ConfigError::Invalid("runner.timeout_ms must be positive".into()));
        }
        if self.runner.max_output_bytes == 0 {
            return Err(ConfigError::Invalid(
                "runner.max_output_bytes must be positive".into(),
            ));
        }
        if self.runner.interpreter.trim().is_empty() {
            return Err(ConfigError::Invalid("runner.interpreter must not be empty".into()));
        }
        if self.max_source_chars == 0 {
            return Err(ConfigError::Invalid("max_source_chars must be positive".into()));
        }
        Ok(())
    }
}
