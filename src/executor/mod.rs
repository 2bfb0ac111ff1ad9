// Executor module - validates requests and drives one execution end to end

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod types;
pub mod workspace;

pub use config::ExecutorConfig;
pub use error::{ConfigError, ExecutorError, Result};
pub use orchestrator::{Executor, USER_CODE_FILE};
pub use types::{ExecutionRequest, ExecutionResult};
pub use workspace::ScratchWorkspace;
