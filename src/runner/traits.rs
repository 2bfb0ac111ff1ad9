// ScriptRunner trait

use crate::runner::RawProcessResult;
use async_trait::async_trait;
use std::path::Path;

/// Runs one script file to completion and reports what happened.
///
/// Implementations never fail: launch problems, timeouts and oversized output
/// are all reported inside the returned result.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &Path, working_dir: &Path) -> RawProcessResult;
}
