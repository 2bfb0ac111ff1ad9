// Data types for Runner module

use serde::Serialize;
use std::fmt;
use std::io;

/// Why the interpreter could not be started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnFailure {
    /// The interpreter binary is not on PATH
    InterpreterMissing { interpreter: String },
    /// Any other launch failure (permissions, resource exhaustion, ...)
    Other(String),
}

impl SpawnFailure {
    pub fn from_io(interpreter: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SpawnFailure::InterpreterMissing {
                interpreter: interpreter.to_string(),
            },
            _ => SpawnFailure::Other(err.to_string()),
        }
    }
}

impl fmt::Display for SpawnFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnFailure::InterpreterMissing { interpreter } => write!(
                f,
                "Python not found ('{}'). Please install Python and ensure it's in your PATH.\n\
                 Windows users: Install from python.org\n\
                 Linux/Mac users: Use your system package manager",
                interpreter
            ),
            SpawnFailure::Other(msg) => write!(f, "Execution error: {}", msg),
        }
    }
}

/// Terminal outcome of one runner invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOutcome {
    Exited,
    TimedOut,
    Overflowed,
    SpawnFailed,
}

/// Lifecycle of a spawned script
///
/// `Running -> Resolved(outcome) -> Terminated(outcome)`. Only the first
/// resolution is recorded; every later one is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Resolved(ProcessOutcome),
    Terminated(ProcessOutcome),
}

impl ProcessState {
    /// Record `outcome` if nothing has resolved yet. Returns whether it won.
    pub fn resolve(&mut self, outcome: ProcessOutcome) -> bool {
        match self {
            ProcessState::Running => {
                *self = ProcessState::Resolved(outcome);
                true
            }
            _ => false,
        }
    }

    /// Mark the process as gone. No-op unless resolved.
    pub fn terminate(&mut self) {
        if let ProcessState::Resolved(outcome) = *self {
            *self = ProcessState::Terminated(outcome);
        }
    }

    pub fn outcome(&self) -> Option<ProcessOutcome> {
        match self {
            ProcessState::Running => None,
            ProcessState::Resolved(o) | ProcessState::Terminated(o) => Some(*o),
        }
    }
}

/// Raw result of running one script
#[derive(Debug, Clone)]
pub struct RawProcessResult {
    pub outcome: ProcessOutcome,
    /// Exit code, present only when the process exited on its own
    pub exit_code: Option<i32>,
    /// Trimmed stdout, never longer than the configured ceiling
    pub stdout: String,
    /// Trimmed stderr
    pub stderr: String,
    pub timed_out: bool,
    pub truncated: bool,
    pub spawn_error: Option<SpawnFailure>,
    /// User-facing explanation for timeout and overflow
    pub notice: Option<String>,
    pub duration_ms: u64,
}

impl RawProcessResult {
    pub fn spawn_failed(failure: SpawnFailure, duration_ms: u64) -> Self {
        Self {
            outcome: ProcessOutcome::SpawnFailed,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
            truncated: false,
            spawn_error: Some(failure),
            notice: None,
            duration_ms,
        }
    }

    /// Exited on its own with status 0
    pub fn succeeded(&self) -> bool {
        self.outcome == ProcessOutcome::Exited && self.exit_code == Some(0)
    }

    /// Text for the caller's `errors` field
    ///
    /// Spawn diagnostic first, then the timeout/overflow notice, then stderr.
    pub fn errors(&self) -> Option<String> {
        if let Some(failure) = &self.spawn_error {
            return Some(failure.to_string());
        }
        if let Some(notice) = &self.notice {
            return Some(notice.clone());
        }
        if self.stderr.is_empty() {
            None
        } else {
            Some(self.stderr.clone())
        }
    }
}

/// "3s" or "2.5s"
pub(crate) fn format_secs(ms: u64) -> String {
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

/// "512KB", "1MB", "900B"
pub(crate) fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{}B", bytes)
    }
}

pub(crate) fn timeout_notice(timeout_ms: u64) -> String {
    format!(
        "Code execution timed out after {}.\n\
         This usually means:\n\
         • Your code has an infinite loop\n\
         • You're using input() which waits for user input\n\
         • The code is taking too long to execute",
        format_secs(timeout_ms)
    )
}

pub(crate) fn overflow_notice(max_output_bytes: usize) -> String {
    format!(
        "Output too large (>{}). Consider reducing print statements.",
        format_bytes(max_output_bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_resolves_once() {
        let mut state = ProcessState::Running;
        assert_eq!(state.outcome(), None);

        assert!(state.resolve(ProcessOutcome::TimedOut));
        assert!(!state.resolve(ProcessOutcome::Exited));
        assert!(!state.resolve(ProcessOutcome::Overflowed));
        assert_eq!(state, ProcessState::Resolved(ProcessOutcome::TimedOut));

        state.terminate();
        assert_eq!(state, ProcessState::Terminated(ProcessOutcome::TimedOut));
        assert!(!state.resolve(ProcessOutcome::SpawnFailed));
        assert_eq!(state.outcome(), Some(ProcessOutcome::TimedOut));
    }

    #[test]
    fn test_terminate_requires_resolution() {
        let mut state = ProcessState::Running;
        state.terminate();
        assert_eq!(state, ProcessState::Running);
    }

    #[test]
    fn test_spawn_failure_classification() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let failure = SpawnFailure::from_io("python3", &missing);
        assert!(matches!(failure, SpawnFailure::InterpreterMissing { .. }));
        assert!(failure.to_string().starts_with("Python not found"));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let failure = SpawnFailure::from_io("python3", &denied);
        assert_eq!(failure, SpawnFailure::Other("denied".to_string()));
        assert_eq!(failure.to_string(), "Execution error: denied");
    }

    #[test]
    fn test_errors_priority() {
        let mut result = RawProcessResult::spawn_failed(SpawnFailure::Other("boom".into()), 1);
        result.stderr = "ignored".into();
        assert_eq!(result.errors().as_deref(), Some("Execution error: boom"));

        result.spawn_error = None;
        result.notice = Some("slow".into());
        assert_eq!(result.errors().as_deref(), Some("slow"));

        result.notice = None;
        assert_eq!(result.errors().as_deref(), Some("ignored"));

        result.stderr.clear();
        assert_eq!(result.errors(), None);
    }

    #[test]
    fn test_notices() {
        assert_eq!(format_secs(3000), "3s");
        assert_eq!(format_secs(2500), "2.5s");
        assert_eq!(format_bytes(512 * 1024), "512KB");
        assert_eq!(format_bytes(1024 * 1024), "1MB");
        assert_eq!(format_bytes(100), "100B");
        assert!(timeout_notice(3000).starts_with("Code execution timed out after 3s."));
        assert_eq!(
            overflow_notice(1024 * 1024),
            "Output too large (>1MB). Consider reducing print statements."
        );
    }
}
