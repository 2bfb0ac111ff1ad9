//! Bounded execution of learner-submitted Python code.
//!
//! `Executor::execute` takes an `ExecutionRequest`, runs the source in a
//! private scratch directory under a wall-clock and output limit, optionally
//! harnesses it against an exercise's test script, and returns an
//! `ExecutionResult` describing what happened.

pub mod executor;
pub mod harness;
pub mod interpret;
pub mod runner;
pub mod sanitizer;
pub mod store;

pub use executor::{
    ConfigError, ExecutionRequest, ExecutionResult, Executor, ExecutorConfig, ExecutorError,
};
pub use interpret::{TestCaseOutcome, TestRunResult};
pub use runner::{ProcessRunner, RawProcessResult, RunnerConfig, ScriptRunner};
pub use store::{DirectoryStore, MemoryStore, StoreError, TestScriptSource};
