// Process termination: SIGTERM to the group, grace period, then SIGKILL

use std::time::Duration;
use tokio::process::Child;
use tracing::{debug, warn};

/// Stop a running child, escalating from a polite signal to a forced kill.
///
/// On Unix the child leads its own process group, so both signals reach any
/// processes it started. Elsewhere the child is killed outright.
pub(crate) async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            signal_group(pid, nix::sys::signal::Signal::SIGTERM);
            let exited = tokio::time::timeout(grace, child.wait()).await.is_ok();
            signal_group(pid, nix::sys::signal::Signal::SIGKILL);
            if exited {
                debug!(pid, "process exited within grace period");
                return;
            }
        }
    }
    #[cfg(not(unix))]
    let _ = grace;

    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill process");
    }
}

/// Kill whatever is left in the child's process group after it exited.
pub(crate) fn sweep_group(pid: Option<u32>) {
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            signal_group(pid, nix::sys::signal::Signal::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pid, signal = ?signal, error = %e, "failed to signal process group"),
    }
}
