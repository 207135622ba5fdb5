// src/exec/retry.rs

//! Bounded, fixed-backoff retry policy for deleting build artifacts.
//!
//! A freshly killed process can keep its executable locked for a short while
//! (notably on Windows), so deletion is retried in place rather than failing
//! the whole teardown.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::fs::FileSystem;

/// Retry parameters: at most `max_attempts` tries, `backoff` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    /// 10 attempts, 300ms apart.
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Duration::from_millis(300),
        }
    }
}

/// Result of [`remove_with_retry`].
#[derive(Debug)]
pub enum RemoveOutcome {
    /// The file was deleted on attempt `attempts` (1-based).
    Removed { attempts: u32 },
    /// The file did not exist (treated as already clean).
    AlreadyAbsent { attempts: u32 },
    /// Every attempt failed; `error` is the last failure.
    GaveUp { attempts: u32, error: std::io::Error },
}

impl RemoveOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            RemoveOutcome::Removed { attempts }
            | RemoveOutcome::AlreadyAbsent { attempts }
            | RemoveOutcome::GaveUp { attempts, .. } => *attempts,
        }
    }

    pub fn is_clean(&self) -> bool {
        !matches!(self, RemoveOutcome::GaveUp { .. })
    }
}

/// Delete `path`, retrying per `policy`. Never returns an error; exhaustion
/// is reported through the outcome and a warning.
pub async fn remove_with_retry(
    fs: &dyn FileSystem,
    path: &Path,
    policy: RetryPolicy,
) -> RemoveOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        info!(
            file = ?path,
            attempt,
            max_attempts,
            "deleting file"
        );

        match fs.remove_file(path) {
            Ok(()) => {
                info!(file = ?path, "file deleted");
                return RemoveOutcome::Removed { attempts: attempt };
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(file = ?path, "file not found; nothing to delete");
                return RemoveOutcome::AlreadyAbsent { attempts: attempt };
            }
            Err(error) if attempt >= max_attempts => {
                warn!(
                    file = ?path,
                    attempts = attempt,
                    error = %error,
                    "giving up deleting file"
                );
                return RemoveOutcome::GaveUp {
                    attempts: attempt,
                    error,
                };
            }
            Err(e) => {
                warn!(
                    file = ?path,
                    error = %e,
                    retry_in_ms = policy.backoff.as_millis() as u64,
                    "delete failed; retrying"
                );
                sleep(policy.backoff).await;
                attempt += 1;
            }
        }
    }
}
