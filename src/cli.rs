// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `voyeur`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "voyeur",
    version,
    about = "Rebuild and restart executables when watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Voyeur.toml` in the current working directory. Relative
    /// paths inside it are resolved against its directory.
    #[arg(long, value_name = "PATH", default_value = crate::config::loader::DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Poll interval in seconds; overrides `[config].interval`.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `VOYEUR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved config, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["voyeur"]).unwrap();
        assert_eq!(args.config, "Voyeur.toml");
        assert!(args.interval.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(CliArgs::try_parse_from(["voyeur", "--interval", "0"]).is_err());
    }

    #[test]
    fn overrides_parse() {
        let args = CliArgs::try_parse_from([
            "voyeur",
            "--config",
            "dev/Voyeur.toml",
            "--interval",
            "3",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.config, "dev/Voyeur.toml");
        assert_eq!(args.interval, Some(3));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
