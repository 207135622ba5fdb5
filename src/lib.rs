// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod shutdown;
pub mod supervisor;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::{config_root_dir, load_and_validate};
use crate::config::model::{ConfigFile, ExecutableSpec};
use crate::fs::RealFileSystem;
use crate::supervisor::Supervisor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ `--interval` override)
/// - the supervisor built from the config
/// - SIGINT / SIGTERM handling through a cancellation token
///
/// Returns `Ok` after a signal-driven shutdown and `Err` when the run ended
/// because of a startup, restart, or watch failure. Both paths have already
/// stopped every managed process by the time this returns.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    apply_overrides(&mut cfg, &args);

    let root_dir = config_root_dir(&config_path);

    if args.dry_run {
        print_dry_run(&cfg, &root_dir);
        return Ok(());
    }

    info!(config = ?config_path, root = ?root_dir, "configuration loaded");

    let token = CancellationToken::new();
    let signals = shutdown::cancel_on_signal(token.clone());

    let supervisor =
        Supervisor::from_config(&cfg, &root_dir, Arc::new(RealFileSystem), token.clone());
    let result = supervisor.run().await;

    // Release the signal task if we ended on our own.
    token.cancel();
    let _ = signals.await;

    result.map_err(Into::into)
}

/// CLI flags that take precedence over the config file.
fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    if let Some(secs) = args.interval {
        cfg.config.interval = secs;
    }
}

/// Simple dry-run output: print the resolved timing, targets and executables.
fn print_dry_run(cfg: &ConfigFile, root: &std::path::Path) {
    println!("voyeur dry-run");
    println!("  root = {}", root.display());
    println!("  config.interval = {}s", cfg.config.interval);
    println!("  config.kill_timeout = {}s", cfg.config.kill_timeout);
    println!(
        "  config.delete = {} attempts, {}ms apart",
        cfg.config.delete_attempts, cfg.config.delete_backoff_ms
    );
    println!();

    println!("targets ({}):", cfg.targets.len());
    for target in &cfg.targets {
        println!("  - {}", root.join(target).display());
    }
    println!();

    println!("executables ({}):", cfg.executables.len());
    for spec in &cfg.executables {
        println!("  - {}", spec.name());
        match spec {
            ExecutableSpec::CompiledBinary {
                build_cmd,
                binary_path,
                args,
                ..
            } => {
                println!("      build: {build_cmd:?}");
                println!("      binary: {}", root.join(binary_path).display());
                if !args.is_empty() {
                    println!("      args: {args:?}");
                }
            }
            ExecutableSpec::Script {
                run_cmd,
                script_path,
                ..
            } => {
                println!("      run: {run_cmd:?}");
                println!("      script: {}", root.join(script_path).display());
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
