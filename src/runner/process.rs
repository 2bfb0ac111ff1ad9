// ProcessRunner - spawns the interpreter and races exit, overflow and timeout

use crate::runner::config::RunnerConfig;
use crate::runner::terminate::{sweep_group, terminate};
use crate::runner::traits::ScriptRunner;
use crate::runner::types::{
    ProcessOutcome, ProcessState, RawProcessResult, SpawnFailure, overflow_notice, timeout_notice,
};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Upper bound on collecting reader tasks once the process is gone
const IO_CAPTURE_TIMEOUT: Duration = Duration::from_secs(1);

const READ_CHUNK: usize = 8192;

/// Bytes captured from one pipe
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    overflowed: bool,
}

/// Runs scripts with the configured interpreter
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    pub fn new(config: RunnerConfig) -> Self {
        debug!(
            interpreter = %config.interpreter,
            timeout_ms = config.timeout_ms,
            max_output_bytes = config.max_output_bytes,
            "initializing process runner"
        );
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `script` inside `working_dir`; resolves exactly once
    pub async fn run_script(&self, script: &Path, working_dir: &Path) -> RawProcessResult {
        let started = Instant::now();
        let max_bytes = self.config.max_output_bytes;

        let mut cmd = Command::new(&self.config.interpreter);
        cmd.args(&self.config.interpreter_args)
            .arg(script)
            .current_dir(working_dir)
            .env("PYTHONUNBUFFERED", "1")
            .env("PYTHONIOENCODING", "utf-8")
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(
            interpreter = %self.config.interpreter,
            script = %script.display(),
            "spawning interpreter"
        );

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let failure = SpawnFailure::from_io(&self.config.interpreter, &e);
                warn!(interpreter = %self.config.interpreter, error = %e, "failed to spawn interpreter");
                return RawProcessResult::spawn_failed(failure, elapsed_ms(started));
            }
        };
        let pid = child.id();

        // Closed stdin: input() raises EOFError instead of blocking
        drop(child.stdin.take());

        let (overflow_tx, overflow_rx) = oneshot::channel::<()>();
        let mut stdout_task = child
            .stdout
            .take()
            .map(|stdout| tokio::spawn(read_capped(stdout, max_bytes, Some(overflow_tx))));
        let mut stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(read_capped(stderr, max_bytes, None)));

        // A dropped sender means stdout closed without overflowing
        let overflow = async {
            if overflow_rx.await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        tokio::pin!(overflow);
        let deadline = tokio::time::sleep(self.config.timeout());
        tokio::pin!(deadline);

        let mut state = ProcessState::Running;
        let mut exit_code = None;

        tokio::select! {
            biased;
            () = &mut overflow => {
                state.resolve(ProcessOutcome::Overflowed);
            }
            status = child.wait() => {
                match status {
                    Ok(status) => exit_code = status.code(),
                    Err(e) => warn!(error = %e, "failed to wait for interpreter"),
                }
                state.resolve(ProcessOutcome::Exited);
            }
            () = &mut deadline => {
                state.resolve(ProcessOutcome::TimedOut);
            }
        }

        let mut outcome = state.outcome().unwrap_or(ProcessOutcome::Exited);
        match outcome {
            ProcessOutcome::TimedOut | ProcessOutcome::Overflowed => {
                warn!(pid = ?pid, outcome = ?outcome, "terminating interpreter");
                terminate(&mut child, self.config.kill_grace()).await;
            }
            _ => sweep_group(pid),
        }
        state.terminate();

        let stdout = collect(&mut stdout_task, "stdout").await;
        let stderr = collect(&mut stderr_task, "stderr").await;

        // Exit can win the race against the reader's overflow signal; the
        // bytes were still written before the pipe closed
        if stdout.overflowed && outcome == ProcessOutcome::Exited {
            debug!(pid = ?pid, "stdout exceeded limit before exit was observed");
            outcome = ProcessOutcome::Overflowed;
        }

        let notice = match outcome {
            ProcessOutcome::TimedOut => Some(timeout_notice(self.config.timeout_ms)),
            ProcessOutcome::Overflowed => Some(overflow_notice(max_bytes)),
            _ => None,
        };

        let result = RawProcessResult {
            outcome,
            exit_code,
            stdout: decode(stdout.bytes, max_bytes).trim().to_string(),
            stderr: decode(stderr.bytes, max_bytes).trim().to_string(),
            timed_out: outcome == ProcessOutcome::TimedOut,
            truncated: outcome == ProcessOutcome::Overflowed,
            spawn_error: None,
            notice,
            duration_ms: elapsed_ms(started),
        };

        info!(
            script = %script.display(),
            outcome = ?result.outcome,
            exit_code = ?result.exit_code,
            duration_ms = result.duration_ms,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "script finished"
        );

        result
    }
}

#[async_trait]
impl ScriptRunner for ProcessRunner {
    async fn run(&self, script: &Path, working_dir: &Path) -> RawProcessResult {
        self.run_script(script, working_dir).await
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

/// Read a pipe to EOF, keeping at most `max_bytes`.
///
/// Once more than `max_bytes` have arrived the overflow signal fires and the
/// rest of the stream is drained and discarded.
async fn read_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    max_bytes: usize,
    mut overflow_tx: Option<oneshot::Sender<()>>,
) -> std::io::Result<Captured> {
    let mut captured = Captured {
        bytes: Vec::with_capacity(READ_CHUNK.min(max_bytes)),
        overflowed: false,
    };
    let mut chunk = [0u8; READ_CHUNK];
    let mut total = 0usize;

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if captured.overflowed {
            continue;
        }

        total = total.saturating_add(n);
        let remaining = max_bytes.saturating_sub(captured.bytes.len());
        captured.bytes.extend_from_slice(&chunk[..n.min(remaining)]);

        if total > max_bytes {
            captured.overflowed = true;
            if let Some(tx) = overflow_tx.take() {
                let _ = tx.send(());
            }
        }
    }

    Ok(captured)
}

/// Join a reader task, giving up after `IO_CAPTURE_TIMEOUT`
async fn collect(
    task: &mut Option<JoinHandle<std::io::Result<Captured>>>,
    stream: &'static str,
) -> Captured {
    let Some(handle) = task.as_mut() else {
        return Captured::default();
    };

    match tokio::time::timeout(IO_CAPTURE_TIMEOUT, &mut *handle).await {
        Ok(Ok(Ok(captured))) => captured,
        Ok(Ok(Err(e))) => {
            warn!(stream, error = %e, "output capture failed");
            Captured::default()
        }
        Ok(Err(e)) => {
            warn!(stream, error = %e, "output reader panicked");
            Captured::default()
        }
        Err(_) => {
            warn!(stream, "output capture timed out");
            handle.abort();
            Captured::default()
        }
    }
}

/// Lossy UTF-8 decode that never exceeds `max_bytes`
fn decode(mut bytes: Vec<u8>, max_bytes: usize) -> String {
    // A multi-byte character cut by the cap is dropped rather than replaced
    if let Err(e) = std::str::from_utf8(&bytes) {
        if e.error_len().is_none() {
            bytes.truncate(e.valid_up_to());
        }
    }

    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if text.len() > max_bytes {
        let mut cut = max_bytes;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
