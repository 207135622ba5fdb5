// src/supervisor/state.rs

use std::fmt;

/// Lifecycle of a supervisor run.
///
/// `Idle → Starting → Running → Stopping → Terminated`; `Starting` and
/// `Running` may jump straight to `Stopping` on a signal or a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    Stopping,
    Terminated,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Stopping => "stopping",
            SupervisorState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No target moved forward.
    Unchanged,
    /// At least one target changed and a full restart cycle completed.
    Restarted,
    /// Shutdown was requested while executables were being started.
    Interrupted,
}

/// Result of starting every executable in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPhase {
    Started,
    Failed { name: String },
    Interrupted,
}
