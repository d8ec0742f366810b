//! Target process lifecycle: acquisition and guaranteed termination.
//!
//! `TargetProcess` is a scoped guard. Termination runs on every exit path —
//! early error returns and panics included — via `Drop`, so a failed run
//! cannot leak the control-plane process into the next one.
//!
//! Termination escalates: SIGTERM, bounded grace wait, SIGKILL. It is
//! idempotent and treats an already-gone process as success.

use std::fs;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::core::config::TargetConfig;
use crate::core::errors::{Result, SahError};

/// How the harness came to own the target process.
#[derive(Debug)]
enum Ownership {
    /// Child spawned by the harness.
    Spawned(Child),
    /// Externally started process, adopted via pidfile.
    Attached { pid: i32 },
}

/// Guard over the externally running storage-control process.
#[derive(Debug)]
pub struct TargetProcess {
    ownership: Ownership,
    grace: Duration,
    terminated: bool,
}

impl TargetProcess {
    /// Acquire the target per configuration: spawn it, or attach to the pid
    /// named in the configured pidfile.
    pub fn acquire(config: &TargetConfig) -> Result<Self> {
        if config.spawn {
            Self::spawn(config)
        } else {
            let pidfile = config.pidfile.as_ref().ok_or_else(|| SahError::InvalidConfig {
                details: "attach mode requires target.pidfile".to_string(),
            })?;
            Self::attach_pidfile(pidfile, config.terminate_grace_ms)
        }
    }

    /// Spawn the target binary and wait out its startup window.
    pub fn spawn(config: &TargetConfig) -> Result<Self> {
        let child = Command::new(&config.bin)
            .args(&config.bin_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SahError::ProcessControl {
                details: format!("failed to spawn {}: {e}", config.bin.display()),
            })?;

        if config.startup_wait_ms > 0 {
            thread::sleep(Duration::from_millis(config.startup_wait_ms));
        }

        Ok(Self {
            ownership: Ownership::Spawned(child),
            grace: Duration::from_millis(config.terminate_grace_ms),
            terminated: false,
        })
    }

    /// Attach to an externally managed process via its pidfile.
    pub fn attach_pidfile(pidfile: &Path, grace_ms: u64) -> Result<Self> {
        let raw = fs::read_to_string(pidfile).map_err(|e| SahError::io(pidfile, e))?;
        let pid: i32 = raw.trim().parse().map_err(|_| SahError::ProcessControl {
            details: format!("pidfile {} does not contain a pid: {raw:?}", pidfile.display()),
        })?;
        Ok(Self {
            ownership: Ownership::Attached { pid },
            grace: Duration::from_millis(grace_ms),
            terminated: false,
        })
    }

    /// Pid of the managed process, for logging.
    #[must_use]
    pub fn pid(&self) -> u32 {
        match &self.ownership {
            Ownership::Spawned(child) => child.id(),
            Ownership::Attached { pid } => {
                u32::try_from(*pid).unwrap_or_default()
            }
        }
    }

    /// Terminate the target. Idempotent: calling again after success (or on
    /// a process that already exited) is a no-op.
    pub fn terminate(&mut self) -> Result<()> {
        if self.terminated {
            return Ok(());
        }
        let outcome = match &mut self.ownership {
            Ownership::Spawned(child) => terminate_child(child, self.grace),
            Ownership::Attached { pid } => terminate_pid(*pid, self.grace),
        };
        if outcome.is_ok() {
            self.terminated = true;
        }
        outcome
    }
}

impl Drop for TargetProcess {
    fn drop(&mut self) {
        if !self.terminated
            && let Err(e) = self.terminate()
        {
            eprintln!("[SAH-TARGET] cleanup termination failed: {e}");
        }
    }
}

// ──────────────────────── termination internals ────────────────────────

fn terminate_child(child: &mut Child, grace: Duration) -> Result<()> {
    // Already exited?
    if matches!(child.try_wait(), Ok(Some(_))) {
        return Ok(());
    }

    #[cfg(unix)]
    {
        let pid = nix::unistd::Pid::from_raw(i32::try_from(child.id()).unwrap_or_default());
        // ESRCH means the process raced us to exit; that is success.
        match nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM) {
            Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
            Err(e) => {
                return Err(SahError::ProcessControl {
                    details: format!("SIGTERM to pid {pid} failed: {e}"),
                });
            }
        }
    }
    #[cfg(not(unix))]
    {
        // No graceful signal available; fall through to the hard kill.
    }

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if matches!(child.try_wait(), Ok(Some(_))) {
            return Ok(());
        }
        thread::sleep(Duration::from_millis(50));
    }

    child.kill().map_err(|e| SahError::ProcessControl {
        details: format!("SIGKILL of pid {} failed: {e}", child.id()),
    })?;
    child.wait().map_err(|e| SahError::ProcessControl {
        details: format!("wait on pid {} failed: {e}", child.id()),
    })?;
    Ok(())
}

#[cfg(unix)]
fn terminate_pid(pid: i32, grace: Duration) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let target = Pid::from_raw(pid);
    match kill(target, Signal::SIGTERM) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(()),
        Err(e) => {
            return Err(SahError::ProcessControl {
                details: format!("SIGTERM to pid {pid} failed: {e}"),
            });
        }
    }

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        // Signal 0 probes existence without delivering anything.
        match kill(target, None) {
            Err(Errno::ESRCH) => return Ok(()),
            _ => thread::sleep(Duration::from_millis(50)),
        }
    }

    match kill(target, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(SahError::ProcessControl {
            details: format!("SIGKILL of pid {pid} failed: {e}"),
        }),
    }
}

#[cfg(not(unix))]
fn terminate_pid(pid: i32, _grace: Duration) -> Result<()> {
    Err(SahError::ProcessControl {
        details: format!("attach-mode termination of pid {pid} is unix-only"),
    })
}

// ──────────────────────── tests ────────────────────────

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sleeper_config() -> TargetConfig {
        TargetConfig {
            bin: PathBuf::from("/bin/sleep"),
            bin_args: vec!["30".to_string()],
            spawn: true,
            startup_wait_ms: 0,
            terminate_grace_ms: 2000,
            ..TargetConfig::default()
        }
    }

    #[test]
    fn spawn_and_terminate() {
        let mut target = TargetProcess::spawn(&sleeper_config()).unwrap();
        assert!(target.pid() > 0);
        target.terminate().unwrap();
        // Idempotent.
        target.terminate().unwrap();
    }

    #[test]
    fn terminate_after_natural_exit_is_ok() {
        let mut config = sleeper_config();
        config.bin_args = vec!["0.01".to_string()];
        let mut target = TargetProcess::spawn(&config).unwrap();
        thread::sleep(Duration::from_millis(300));
        target.terminate().unwrap();
    }

    #[test]
    fn drop_terminates_spawned_child() {
        let child_pid;
        {
            let target = TargetProcess::spawn(&sleeper_config()).unwrap();
            child_pid = i32::try_from(target.pid()).unwrap();
        }
        // Give SIGTERM a moment to land, then probe.
        let deadline = Instant::now() + Duration::from_secs(3);
        loop {
            let gone = matches!(
                nix::sys::signal::kill(nix::unistd::Pid::from_raw(child_pid), None),
                Err(nix::errno::Errno::ESRCH)
            );
            if gone {
                break;
            }
            // A just-terminated direct child lingers as a zombie until reaped,
            // so existence alone is not proof of a leak; Drop reaps via wait().
            assert!(
                Instant::now() < deadline,
                "dropped target pid {child_pid} still running"
            );
            thread::sleep(Duration::from_millis(50));
        }
    }

    #[test]
    fn attach_to_dead_pid_terminates_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = dir.path().join("target.pid");
        // Spawn a process, let it exit, then attach to the stale pid.
        let mut child = Command::new("/bin/sleep").arg("0.01").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        fs::write(&pidfile, format!("{pid}\n")).unwrap();

        let mut target = TargetProcess::attach_pidfile(&pidfile, 500).unwrap();
        target.terminate().unwrap();
    }

    #[test]
    fn garbage_pidfile_is_process_control_error() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = dir.path().join("target.pid");
        fs::write(&pidfile, "not-a-pid\n").unwrap();
        let err = TargetProcess::attach_pidfile(&pidfile, 500).unwrap_err();
        assert_eq!(err.code(), "SAH-3101");
    }

    #[test]
    fn missing_binary_is_process_control_error() {
        let mut config = sleeper_config();
        config.bin = PathBuf::from("/nonexistent_sah_target_bin");
        let err = TargetProcess::spawn(&config).unwrap_err();
        assert_eq!(err.code(), "SAH-3101");
    }
}
