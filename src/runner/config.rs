// Runner configuration

use serde::Deserialize;
use std::time::Duration;

/// Interpreter launcher for the host platform
pub fn default_interpreter() -> &'static str {
    if cfg!(windows) { "py" } else { "python3" }
}

/// Process runner configuration
///
/// One runner is built per caller context; the presets cover the two
/// deployments the portal runs (interactive editor and exercise service).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Wall-clock limit for one script in milliseconds
    pub timeout_ms: u64,
    /// Maximum captured stdout in bytes before the process is killed
    pub max_output_bytes: usize,
    /// Delay between SIGTERM and SIGKILL in milliseconds
    pub kill_grace_ms: u64,
    /// Interpreter binary, resolved through PATH
    pub interpreter: String,
    /// Arguments placed before the script path
    pub interpreter_args: Vec<String>,
}

impl RunnerConfig {
    /// 3 seconds, 512KB: quick feedback in the editor
    pub fn fast() -> Self {
        Self {
            timeout_ms: 3_000,
            max_output_bytes: 512 * 1024,
            ..Self::extended()
        }
    }

    /// 5 seconds, 1MB: exercise test runs
    pub fn extended() -> Self {
        Self {
            timeout_ms: 5_000,
            max_output_bytes: 1024 * 1024,
            kill_grace_ms: 250,
            interpreter: default_interpreter().to_string(),
            interpreter_args: vec!["-u".to_string()],
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::extended()
    }
}
