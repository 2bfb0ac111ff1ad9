// Runner module - bounded interpreter subprocesses

pub mod config;
pub mod process;
mod terminate;
pub mod traits;
pub mod types;

pub use config::{RunnerConfig, default_interpreter};
pub use process::ProcessRunner;
pub use traits::ScriptRunner;
pub use types::{ProcessOutcome, ProcessState, RawProcessResult, SpawnFailure};
