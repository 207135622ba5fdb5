#![allow(dead_code, unused_imports)]

pub use voyeur_test_utils::builders;
pub use voyeur_test_utils::fake_executable::{FakeExecutable, Journal, StartScript};
pub use voyeur_test_utils::{init_tracing, with_timeout};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use voyeur::fs::mock::MockFileSystem;
use voyeur::supervisor::Supervisor;

/// A supervisor over fakes and an in-memory filesystem, polling once a second.
pub fn fake_supervisor(
    executables: Vec<FakeExecutable>,
    targets: &[&str],
    fs: &MockFileSystem,
    shutdown: &CancellationToken,
) -> Supervisor<FakeExecutable> {
    Supervisor::new(
        executables,
        targets.iter().map(|p| PathBuf::from(*p)).collect(),
        Duration::from_secs(1),
        Arc::new(fs.clone()),
        shutdown.clone(),
    )
}
