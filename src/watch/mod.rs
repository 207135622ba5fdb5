// src/watch/mod.rs

//! Change detection by polling modification times.
//!
//! This module is responsible for:
//! - Computing the newest mtime under a watched path ([`mtime`]).
//! - Tracking the accepted baseline per watched path ([`target`]).
//!
//! It does **not** know about executables; the supervisor decides what a
//! change means.

pub mod mtime;
pub mod target;

pub use mtime::latest_mtime;
pub use target::Target;
