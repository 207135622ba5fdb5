// src/watch/target.rs

use std::path::{Path, PathBuf};

use crate::errors::{Result, VoyeurError};
use crate::fs::FileSystem;
use crate::watch::mtime::latest_mtime;

/// A watched path and the newest modification time accepted for it.
#[derive(Debug, Clone)]
pub struct Target {
    path: PathBuf,
    last_mtime: f64,
}

impl Target {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_mtime: 0.0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_mtime(&self) -> f64 {
        self.last_mtime
    }

    /// Recompute the current timestamp for this target without storing it.
    pub fn refresh(&self, fs: &dyn FileSystem) -> Result<f64> {
        latest_mtime(fs, &self.path).map_err(|source| VoyeurError::TargetUnreadable {
            path: self.path.clone(),
            source,
        })
    }

    /// Strictly-greater comparison: a timestamp equal to or older than the
    /// stored one is not a change.
    pub fn is_changed_by(&self, observed: f64) -> bool {
        observed > self.last_mtime
    }

    /// Store a new baseline.
    pub fn accept(&mut self, observed: f64) {
        self.last_mtime = observed;
    }
}
