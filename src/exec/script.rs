// src/exec/script.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::exec::process::{command_from_argv, ManagedProcess};
use crate::exec::{BoxFuture, Supervised, Teardown};
use crate::fs::FileSystem;

/// An interpreted script run in place by `run_cmd`.
///
/// There is no build step, and the script is left on disk when stopped.
#[derive(Debug)]
pub struct Script {
    name: String,
    run_cmd: Vec<String>,
    script_path: PathBuf,
    working_dir: PathBuf,
    teardown: Teardown,
    fs: Arc<dyn FileSystem>,
    process: Option<ManagedProcess>,
}

impl Script {
    pub fn new(
        name: impl Into<String>,
        run_cmd: Vec<String>,
        script_path: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            name: name.into(),
            run_cmd,
            script_path: script_path.into(),
            working_dir: working_dir.into(),
            teardown: Teardown::default(),
            fs,
            process: None,
        }
    }

    pub fn with_teardown(mut self, teardown: Teardown) -> Self {
        self.teardown = teardown;
        self
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(ManagedProcess::pid)
    }

    async fn start_inner(&mut self) -> bool {
        if let Some(stale) = self.process.take() {
            warn!(executable = %self.name, "start called while running; stopping old process first");
            stale.terminate(self.teardown.grace).await;
        }

        if !self.fs.exists(&self.script_path) {
            warn!(executable = %self.name, file = ?self.script_path, "script not found");
            return false;
        }

        let cmd = match command_from_argv(&self.run_cmd, &self.working_dir) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!(executable = %self.name, error = %e, "invalid run command");
                return false;
            }
        };

        info!(
            executable = %self.name,
            cmd = %self.run_cmd.join(" "),
            "running command"
        );

        match ManagedProcess::spawn(self.name.clone(), cmd) {
            Ok(process) => {
                info!(executable = %self.name, pid = ?process.pid(), "process started");
                self.process = Some(process);
                true
            }
            Err(e) => {
                warn!(executable = %self.name, error = %e, "run command error");
                false
            }
        }
    }

    async fn stop_inner(&mut self) {
        if let Some(process) = self.process.take() {
            process.terminate(self.teardown.grace).await;
        }
    }
}

impl Supervised for Script {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> BoxFuture<'_, bool> {
        Box::pin(self.start_inner())
    }

    fn stop(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(self.stop_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::fs::RealFileSystem;

    #[tokio::test]
    async fn missing_script_does_not_start() {
        let fs = Arc::new(MockFileSystem::new());
        let mut script = Script::new(
            "worker",
            vec!["python3".to_string(), "./worker.py".to_string()],
            "./worker.py",
            ".",
            fs,
        );

        assert!(!script.start().await);
        assert!(script.pid().is_none());
    }

    #[tokio::test]
    async fn spawn_failure_does_not_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.py");
        std::fs::write(&path, b"print('hi')").unwrap();

        let mut script = Script::new(
            "worker",
            vec!["voyeur-no-such-interpreter-xyz".to_string()],
            &path,
            dir.path(),
            Arc::new(RealFileSystem),
        );

        assert!(!script.start().await);
        assert!(script.pid().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stop_kills_but_keeps_the_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.sh");
        std::fs::write(&path, b"exec sleep 30\n").unwrap();

        let mut script = Script::new(
            "loop",
            vec!["sh".to_string(), "loop.sh".to_string()],
            &path,
            dir.path(),
            Arc::new(RealFileSystem),
        );

        assert!(script.start().await);
        assert!(script.pid().is_some());

        script.stop().await;
        assert!(script.pid().is_none());
        assert!(script.script_path().exists());
    }
}
