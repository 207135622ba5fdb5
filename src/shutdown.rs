// src/shutdown.rs

//! Cross-platform OS signal handling.
//!
//! The supervisor itself never installs signal handlers; it only watches a
//! `CancellationToken`. The binary links the two with [`cancel_on_signal`].
//!
//! Unix: `SIGINT` and `SIGTERM`. Elsewhere: Ctrl-C via [`tokio::signal::ctrl_c`].

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Waits for a termination signal.
///
/// Returns `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv()  => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("received Ctrl-C");
    Ok(())
}

/// Spawn a task that cancels `token` on the first termination signal.
pub fn cancel_on_signal(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            res = wait_for_shutdown_signal() => match res {
                Ok(()) => token.cancel(),
                Err(e) => warn!(error = %e, "failed to listen for termination signals"),
            },
            _ = token.cancelled() => {}
        }
    })
}
