// src/exec/process.rs

//! Owned child-process handle.
//!
//! A [`ManagedProcess`] is the only place a child handle lives. It is spawned
//! with `kill_on_drop(true)`: dropping it force-kills a still-running child.

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{info, warn};

/// Build a command run from `working_dir`. Stdin is closed; stdout and stderr
/// are inherited from the supervisor.
pub fn command(program: impl AsRef<OsStr>, args: &[String], working_dir: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    cmd
}

/// Like [`command`], from a full argv list.
pub fn command_from_argv(argv: &[String], working_dir: &Path) -> io::Result<Command> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "empty command line")
    })?;
    Ok(command(program, args, working_dir))
}

/// A running child owned by exactly one executable.
#[derive(Debug)]
pub struct ManagedProcess {
    label: String,
    child: Child,
    /// Set once `terminate` has sent the kill and reported the outcome.
    torn_down: bool,
}

impl ManagedProcess {
    pub fn spawn(label: impl Into<String>, mut cmd: Command) -> io::Result<Self> {
        cmd.kill_on_drop(true);
        let child = cmd.spawn()?;
        Ok(Self {
            label: label.into(),
            child,
            torn_down: false,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// True while the child has not been reaped.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Force-kill the child and wait up to `grace` for it to exit.
    ///
    /// Kill errors and wait timeouts are logged; this never fails.
    pub async fn terminate(mut self, grace: Duration) {
        self.kill_and_wait(grace).await;
    }

    async fn kill_and_wait(&mut self, grace: Duration) {
        self.torn_down = true;
        let pid = self.pid();
        info!(process = %self.label, ?pid, "killing process");

        if let Err(e) = self.child.start_kill() {
            warn!(
                process = %self.label,
                ?pid,
                error = %e,
                "failed to send kill to process"
            );
        }

        match timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(
                    process = %self.label,
                    ?pid,
                    exit_code = ?status.code(),
                    %status,
                    "process exited"
                );
            }
            Ok(Err(e)) => {
                warn!(
                    process = %self.label,
                    ?pid,
                    error = %e,
                    "process termination error"
                );
            }
            Err(_) => {
                warn!(
                    process = %self.label,
                    ?pid,
                    grace_ms = grace.as_millis() as u64,
                    "process did not exit within grace period"
                );
            }
        }
    }

    /// A live child dropped without an explicit teardown is worth a warning;
    /// after `terminate` the outcome has already been reported.
    fn warns_on_drop(&mut self) -> bool {
        !self.torn_down && self.is_running()
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if self.warns_on_drop() {
            warn!(
                process = %self.label,
                pid = ?self.pid(),
                "process still alive while its handle is dropped; killing"
            );
        }
        if self.is_running() {
            let _ = self.child.start_kill();
        }
    }
}
