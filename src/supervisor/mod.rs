// src/supervisor/mod.rs

//! Orchestration: the "watcher" that ties targets and executables together.
//!
//! - [`core`] holds the [`Supervisor`] state machine and poll loop.
//! - [`state`] holds the small enums describing where a run is.
//!
//! Restarts are always *stop all, then start all*, in configured order for
//! both phases. A failed start, initial or during a restart, tears
//! everything down and ends the run with an error.

pub mod core;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ConfigFile;
use crate::exec::Executable;
use crate::fs::FileSystem;

pub use core::Supervisor;
pub use state::{StartPhase, SupervisorState, TickOutcome};

impl Supervisor<Executable> {
    /// Build the production supervisor from a validated config. Relative
    /// paths are resolved against `root`.
    pub fn from_config(
        cfg: &ConfigFile,
        root: &Path,
        fs: Arc<dyn FileSystem>,
        shutdown: CancellationToken,
    ) -> Self {
        let teardown = cfg.config.teardown();
        let executables = cfg
            .executables
            .iter()
            .map(|spec| Executable::from_spec(spec, root, teardown, Arc::clone(&fs)))
            .collect();
        let targets = cfg.targets.iter().map(|p| root.join(p)).collect();

        Supervisor::new(executables, targets, cfg.config.poll_interval(), fs, shutdown)
    }
}
