// src/supervisor/core.rs

//! The poll loop and its state machine.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{Result, VoyeurError};
use crate::exec::Supervised;
use crate::fs::FileSystem;
use crate::watch::Target;

use super::state::{StartPhase, SupervisorState, TickOutcome};

/// Owns the executables and targets and drives them as a unit.
///
/// All work happens inline on the task that awaits [`Supervisor::run`]; the
/// only outside input is the shutdown token, which is checked at every
/// suspension point (the inter-tick sleep and in-flight starts).
pub struct Supervisor<E: Supervised> {
    executables: Vec<E>,
    targets: Vec<Target>,
    interval: Duration,
    fs: Arc<dyn FileSystem>,
    shutdown: CancellationToken,
    state: SupervisorState,
    /// Length of the prefix of `executables` that must be stopped on
    /// teardown (started, or interrupted mid-start).
    active: usize,
}

impl<E: Supervised> fmt::Debug for Supervisor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.executables.iter().map(|e| e.name()).collect();
        f.debug_struct("Supervisor")
            .field("executables", &names)
            .field("targets", &self.targets)
            .field("interval", &self.interval)
            .field("state", &self.state)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<E: Supervised> Supervisor<E> {
    pub fn new(
        executables: Vec<E>,
        targets: Vec<PathBuf>,
        interval: Duration,
        fs: Arc<dyn FileSystem>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            executables,
            targets: targets.into_iter().map(Target::new).collect(),
            interval,
            fs,
            shutdown,
            state: SupervisorState::Idle,
            active: 0,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn executables(&self) -> &[E] {
        &self.executables
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!(from = %self.state, to = %next, "supervisor state change");
        self.state = next;
    }

    /// Check every target exists, then record its baseline timestamp.
    pub fn prepare(&mut self) -> Result<()> {
        let missing: Vec<PathBuf> = self
            .targets
            .iter()
            .filter(|t| !self.fs.exists(t.path()))
            .map(|t| t.path().to_path_buf())
            .collect();
        if !missing.is_empty() {
            return Err(VoyeurError::MissingTargets(missing));
        }

        for target in self.targets.iter_mut() {
            let observed = target.refresh(self.fs.as_ref())?;
            target.accept(observed);
            debug!(target = ?target.path(), mtime = observed, "baseline recorded");
        }
        Ok(())
    }

    /// Start every executable in configured order, stopping at the first
    /// failure or at a shutdown request.
    pub async fn start_all(&mut self) -> StartPhase {
        let shutdown = self.shutdown.clone();

        for index in 0..self.executables.len() {
            if shutdown.is_cancelled() {
                return StartPhase::Interrupted;
            }

            // Counted before the await so an interrupted start is torn down.
            self.active = index + 1;
            let executable = &mut self.executables[index];
            let name = executable.name().to_string();
            let started = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!(executable = %name, "start interrupted by shutdown");
                    return StartPhase::Interrupted;
                }
                ok = executable.start() => ok,
            };

            if !started {
                self.active = index;
                warn!(executable = %name, "executable failed to start");
                return StartPhase::Failed { name };
            }
        }

        StartPhase::Started
    }

    /// Stop every active executable in configured order.
    pub async fn stop_all(&mut self) {
        let active = std::mem::take(&mut self.active);
        for executable in self.executables[..active].iter_mut() {
            debug!(executable = %executable.name(), "stopping");
            executable.stop().await;
        }
    }

    /// One poll tick: recompute all targets and restart everything once if
    /// any of them moved forward.
    ///
    /// Baselines are only stored after the restart went through, so a failed
    /// restart leaves the change pending.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let observed = self
            .targets
            .iter()
            .map(|t| t.refresh(self.fs.as_ref()))
            .collect::<Result<Vec<f64>>>()?;

        let changed: Vec<usize> = self
            .targets
            .iter()
            .zip(&observed)
            .enumerate()
            .filter(|(_, (target, ts))| target.is_changed_by(**ts))
            .map(|(i, _)| i)
            .collect();

        if changed.is_empty() {
            return Ok(TickOutcome::Unchanged);
        }

        for &i in &changed {
            info!(target = ?self.targets[i].path(), "target was changed");
        }
        info!("restarting...");

        self.stop_all().await;
        match self.start_all().await {
            StartPhase::Started => {}
            StartPhase::Interrupted => return Ok(TickOutcome::Interrupted),
            StartPhase::Failed { name } => return Err(VoyeurError::StartFailed { name }),
        }

        for &i in &changed {
            self.targets[i].accept(observed[i]);
        }
        Ok(TickOutcome::Restarted)
    }

    /// Run until a shutdown request (`Ok`) or an unrecoverable error (`Err`).
    ///
    /// Either way every active executable is stopped exactly once before
    /// this returns.
    pub async fn run(mut self) -> Result<()> {
        info!(
            executables = self.executables.len(),
            targets = self.targets.len(),
            interval_secs = self.interval.as_secs(),
            "supervisor starting"
        );

        let result = self.drive().await;
        if let Err(e) = &result {
            warn!(error = %e, "fatal error; shutting down");
        }

        self.transition(SupervisorState::Stopping);
        info!("cleanup...");
        self.stop_all().await;
        self.transition(SupervisorState::Terminated);
        info!("see you later!");

        result
    }

    async fn drive(&mut self) -> Result<()> {
        self.prepare()?;

        self.transition(SupervisorState::Starting);
        match self.start_all().await {
            StartPhase::Started => {}
            StartPhase::Interrupted => return Ok(()),
            StartPhase::Failed { name } => return Err(VoyeurError::StartFailed { name }),
        }
        self.transition(SupervisorState::Running);

        let shutdown = self.shutdown.clone();
        loop {
            if shutdown.is_cancelled() {
                return Ok(());
            }

            if self.tick().await? == TickOutcome::Interrupted {
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("shutdown requested");
                    return Ok(());
                }
                _ = sleep(self.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::BoxFuture;
    use crate::fs::mock::MockFileSystem;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        ok: bool,
        log: Log,
    }

    impl Supervised for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn start(&mut self) -> BoxFuture<'_, bool> {
            self.log.lock().unwrap().push(format!("start:{}", self.name));
            let ok = self.ok;
            Box::pin(async move { ok })
        }

        fn stop(&mut self) -> BoxFuture<'_, ()> {
            self.log.lock().unwrap().push(format!("stop:{}", self.name));
            Box::pin(async {})
        }
    }

    fn supervisor(oks: &[bool], fs: &MockFileSystem, log: &Log) -> Supervisor<Recorder> {
        let names = ["a", "b", "c", "d"];
        let executables = oks
            .iter()
            .zip(names)
            .map(|(&ok, name)| Recorder {
                name,
                ok,
                log: Arc::clone(log),
            })
            .collect();
        Supervisor::new(
            executables,
            vec![PathBuf::from("src")],
            Duration::from_secs(1),
            Arc::new(fs.clone()),
            CancellationToken::new(),
        )
    }

    #[test]
    fn prepare_seeds_baselines() {
        let fs = MockFileSystem::new();
        fs.add_dir("src", 10.0);
        fs.add_file("src/lib.rs", 42.0);
        let log = Log::default();
        let mut sup = supervisor(&[true], &fs, &log);

        sup.prepare().unwrap();
        assert_eq!(sup.targets()[0].last_mtime(), 42.0);
        assert_eq!(sup.state(), SupervisorState::Idle);
    }

    #[test]
    fn prepare_reports_every_missing_target() {
        let fs = MockFileSystem::new();
        let log = Log::default();
        let mut sup = supervisor(&[true], &fs, &log);

        match sup.prepare() {
            Err(VoyeurError::MissingTargets(paths)) => {
                assert_eq!(paths, vec![PathBuf::from("src")])
            }
            other => panic!("expected MissingTargets, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_start_leaves_only_the_prefix_active() {
        let fs = MockFileSystem::new();
        fs.add_dir("src", 10.0);
        let log = Log::default();
        let mut sup = supervisor(&[true, true, false, true], &fs, &log);

        assert_eq!(
            sup.start_all().await,
            StartPhase::Failed {
                name: "c".to_string()
            }
        );
        assert_eq!(sup.active, 2);

        sup.stop_all().await;
        assert_eq!(sup.active, 0);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start:a", "start:b", "start:c", "stop:a", "stop:b"]
        );
    }

    #[tokio::test]
    async fn run_reports_start_failure() {
        let fs = MockFileSystem::new();
        fs.add_dir("src", 10.0);
        let log = Log::default();
        let sup = supervisor(&[false], &fs, &log);

        let result = sup.run().await;
        assert!(matches!(result, Err(VoyeurError::StartFailed { .. })));
        assert_eq!(*log.lock().unwrap(), vec!["start:a"]);
    }
}
