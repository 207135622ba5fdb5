// src/exec/mod.rs

//! Managed executables.
//!
//! This module is responsible for bringing managed processes up and tearing
//! them down again, and for nothing else: it never decides *when* that
//! happens (that is the supervisor's job).
//!
//! - [`Supervised`] is the two-operation contract (`start`, `stop`) the
//!   supervisor drives. Tests can provide their own implementation that
//!   doesn't spawn real processes.
//! - [`Executable`] is the closed set of production variants:
//!   [`binary::CompiledBinary`] (build, run, delete on stop) and
//!   [`script::Script`] (run in place).
//! - [`process`] owns child handles; [`retry`] holds the artifact deletion
//!   policy.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ExecutableSpec;
use crate::fs::FileSystem;

pub mod binary;
pub mod process;
pub mod retry;
pub mod script;

pub use binary::CompiledBinary;
pub use process::ManagedProcess;
pub use retry::{remove_with_retry, RemoveOutcome, RetryPolicy};
pub use script::Script;

/// Boxed future returned by [`Supervised`] operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something the supervisor can start and stop.
///
/// Neither operation may fail outward: failures are logged and, for
/// `start`, summarised as `false`.
pub trait Supervised: Send {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Bring the executable to a running state. Returns `false` on any
    /// failure, with no process left recorded.
    fn start(&mut self) -> BoxFuture<'_, bool>;

    /// Best-effort teardown. Bounded in time; never fails.
    fn stop(&mut self) -> BoxFuture<'_, ()>;
}

/// Bounds applied while tearing an executable down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Teardown {
    /// How long to wait for a killed process to exit.
    pub grace: Duration,
    /// Artifact deletion policy (compiled binaries only).
    pub delete: RetryPolicy,
}

impl Default for Teardown {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            delete: RetryPolicy::default(),
        }
    }
}

/// Production executable variants.
#[derive(Debug)]
pub enum Executable {
    CompiledBinary(CompiledBinary),
    Script(Script),
}

impl Executable {
    /// Build an executable from its validated description. Relative paths
    /// are resolved against `root`, which is also the working directory of
    /// every command.
    pub fn from_spec(
        spec: &ExecutableSpec,
        root: &Path,
        teardown: Teardown,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        match spec {
            ExecutableSpec::CompiledBinary {
                name,
                build_cmd,
                binary_path,
                args,
            } => Executable::CompiledBinary(
                CompiledBinary::new(name, build_cmd.clone(), root.join(binary_path), root, fs)
                    .with_args(args.clone())
                    .with_teardown(teardown),
            ),
            ExecutableSpec::Script {
                name,
                run_cmd,
                script_path,
            } => Executable::Script(
                Script::new(name, run_cmd.clone(), root.join(script_path), root, fs)
                    .with_teardown(teardown),
            ),
        }
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            Executable::CompiledBinary(b) => b.pid(),
            Executable::Script(s) => s.pid(),
        }
    }
}

impl Supervised for Executable {
    fn name(&self) -> &str {
        match self {
            Executable::CompiledBinary(b) => b.name(),
            Executable::Script(s) => s.name(),
        }
    }

    fn start(&mut self) -> BoxFuture<'_, bool> {
        match self {
            Executable::CompiledBinary(b) => b.start(),
            Executable::Script(s) => s.start(),
        }
    }

    fn stop(&mut self) -> BoxFuture<'_, ()> {
        match self {
            Executable::CompiledBinary(b) => b.stop(),
            Executable::Script(s) => s.stop(),
        }
    }
}
