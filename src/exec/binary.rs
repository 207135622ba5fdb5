// src/exec/binary.rs

//! Build-then-run executable whose artifact is deleted on stop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::exec::process::{command, command_from_argv, ManagedProcess};
use crate::exec::retry::remove_with_retry;
use crate::exec::{BoxFuture, Supervised, Teardown};
use crate::fs::FileSystem;

/// A binary built from source by `build_cmd`, producing `binary_path`.
///
/// The artifact is a disposable build output: every stop deletes it, and
/// every start rebuilds it.
#[derive(Debug)]
pub struct CompiledBinary {
    name: String,
    build_cmd: Vec<String>,
    binary_path: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    teardown: Teardown,
    fs: Arc<dyn FileSystem>,
    process: Option<ManagedProcess>,
}

impl CompiledBinary {
    pub fn new(
        name: impl Into<String>,
        build_cmd: Vec<String>,
        binary_path: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            name: name.into(),
            build_cmd,
            binary_path: binary_path.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            teardown: Teardown::default(),
            fs,
            process: None,
        }
    }

    /// Extra arguments passed to the built artifact.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_teardown(mut self, teardown: Teardown) -> Self {
        self.teardown = teardown;
        self
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(ManagedProcess::pid)
    }

    /// Run the build command to completion and check the artifact exists.
    async fn build(&mut self) -> bool {
        if !run_build(&self.name, &self.build_cmd, &self.working_dir).await {
            return false;
        }

        if !self.fs.exists(&self.binary_path) {
            warn!(
                executable = %self.name,
                file = ?self.binary_path,
                "artifact was not produced by its build command"
            );
            return false;
        }

        true
    }

    fn launch(&mut self) -> bool {
        info!(executable = %self.name, file = ?self.binary_path, "starting process");

        let cmd = command(&self.binary_path, &self.args, &self.working_dir);
        match ManagedProcess::spawn(self.name.clone(), cmd) {
            Ok(process) => {
                info!(executable = %self.name, pid = ?process.pid(), "process started");
                self.process = Some(process);
                true
            }
            Err(e) => {
                warn!(
                    executable = %self.name,
                    file = ?self.binary_path,
                    error = %e,
                    "start error"
                );
                false
            }
        }
    }

    async fn start_inner(&mut self) -> bool {
        if let Some(stale) = self.process.take() {
            warn!(executable = %self.name, "start called while running; stopping old process first");
            stale.terminate(self.teardown.grace).await;
        }

        if !self.build().await {
            return false;
        }
        self.launch()
    }

    async fn stop_inner(&mut self) {
        if let Some(process) = self.process.take() {
            process.terminate(self.teardown.grace).await;
        }
        remove_with_retry(self.fs.as_ref(), &self.binary_path, self.teardown.delete).await;
    }
}

async fn run_build(name: &str, build_cmd: &[String], working_dir: &Path) -> bool {
    let mut cmd = match command_from_argv(build_cmd, working_dir) {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!(executable = %name, error = %e, "invalid build command");
            return false;
        }
    };

    info!(
        executable = %name,
        cmd = %build_cmd.join(" "),
        "running build command"
    );

    match cmd.status().await {
        Ok(status) if status.success() => {
            info!(executable = %name, "build command finished");
            true
        }
        Ok(status) => {
            warn!(
                executable = %name,
                exit_code = ?status.code(),
                %status,
                "build command failed"
            );
            false
        }
        Err(e) => {
            warn!(executable = %name, error = %e, "failed to run build command");
            false
        }
    }
}

impl Supervised for CompiledBinary {
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

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::fs::RealFileSystem;
    use std::time::Duration;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn binary(dir: &Path, build: &str) -> CompiledBinary {
        CompiledBinary::new(
            "app",
            sh(build),
            dir.join("out.bin"),
            dir,
            Arc::new(RealFileSystem),
        )
        .with_teardown(Teardown {
            grace: Duration::from_secs(5),
            delete: crate::exec::RetryPolicy {
                max_attempts: 3,
                backoff: Duration::from_millis(10),
            },
        })
    }

    const BUILD_SLEEPER: &str =
        "printf '#!/bin/sh\\nexec sleep 30\\n' > out.bin && chmod +x out.bin";

    #[tokio::test]
    async fn failing_build_does_not_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut bin = binary(dir.path(), "exit 3");

        assert!(!bin.start().await);
        assert!(bin.pid().is_none());
    }

    #[tokio::test]
    async fn build_without_artifact_does_not_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut bin = binary(dir.path(), "true");

        assert!(!bin.start().await);
        assert!(bin.pid().is_none());
    }

    #[tokio::test]
    async fn start_then_stop_runs_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut bin = binary(dir.path(), BUILD_SLEEPER);

        assert!(bin.start().await);
        assert!(bin.pid().is_some());
        assert!(bin.binary_path().exists());

        bin.stop().await;
        assert!(bin.pid().is_none());
        assert!(!bin.binary_path().exists());
    }

    #[tokio::test]
    async fn stop_without_start_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let mut bin = binary(dir.path(), BUILD_SLEEPER);

        bin.stop().await;
        assert!(bin.pid().is_none());
    }
}
