// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::{RetryPolicy, Teardown};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// interval = 1
///
/// [watch]
/// targets = ["./src", "./assets/config.json"]
///
/// [[executable]]
/// build_cmd = ["go", "build", "-o", "./server.bin", "./cmd/server"]
/// binary_path = "./server.bin"
///
/// [[executable]]
/// run_cmd = ["python3", "./tools/worker.py"]
/// script_path = "./tools/worker.py"
/// ```
///
/// This is the *unvalidated* shape; see [`ConfigFile`] for the checked one.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Timing knobs from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Watched paths from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// All `[[executable]]` entries, in start order.
    #[serde(default)]
    pub executable: Vec<RawExecutable>,
}

/// `[config]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Poll interval in whole seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Seconds to wait for a killed process to exit.
    #[serde(default = "default_kill_timeout")]
    pub kill_timeout: u64,

    /// Attempts at deleting a built artifact on stop.
    #[serde(default = "default_delete_attempts")]
    pub delete_attempts: u32,

    /// Fixed pause between deletion attempts, in milliseconds.
    #[serde(default = "default_delete_backoff_ms")]
    pub delete_backoff_ms: u64,
}

fn default_interval() -> u64 {
    1
}

fn default_kill_timeout() -> u64 {
    5
}

fn default_delete_attempts() -> u32 {
    10
}

fn default_delete_backoff_ms() -> u64 {
    300
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            kill_timeout: default_kill_timeout(),
            delete_attempts: default_delete_attempts(),
            delete_backoff_ms: default_delete_backoff_ms(),
        }
    }
}

impl ConfigSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn teardown(&self) -> Teardown {
        Teardown {
            grace: Duration::from_secs(self.kill_timeout),
            delete: RetryPolicy {
                max_attempts: self.delete_attempts,
                backoff: Duration::from_millis(self.delete_backoff_ms),
            },
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Files or directories polled for modification.
    #[serde(default)]
    pub targets: Vec<PathBuf>,
}

/// One `[[executable]]` entry before its shape is checked.
///
/// Exactly one of these shapes is valid:
/// - `build_cmd` + `binary_path` (+ optional `args`): a compiled binary;
/// - `run_cmd` + `script_path`: a script.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawExecutable {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub build_cmd: Option<Vec<String>>,
    #[serde(default)]
    pub binary_path: Option<PathBuf>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub run_cmd: Option<Vec<String>>,
    #[serde(default)]
    pub script_path: Option<PathBuf>,
}

/// A validated executable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutableSpec {
    CompiledBinary {
        name: String,
        build_cmd: Vec<String>,
        binary_path: PathBuf,
        args: Vec<String>,
    },
    Script {
        name: String,
        run_cmd: Vec<String>,
        script_path: PathBuf,
    },
}

impl ExecutableSpec {
    pub fn name(&self) -> &str {
        match self {
            ExecutableSpec::CompiledBinary { name, .. } | ExecutableSpec::Script { name, .. } => {
                name
            }
        }
    }
}

/// Validated configuration. Construct via `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub targets: Vec<PathBuf>,
    pub executables: Vec<ExecutableSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        targets: Vec<PathBuf>,
        executables: Vec<ExecutableSpec>,
    ) -> Self {
        Self {
            config,
            targets,
            executables,
        }
    }
}
