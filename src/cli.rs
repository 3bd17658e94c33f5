// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `xctask`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "xctask",
    version,
    about = "Run xcodebuild tasks and turn their coverage into gcov reports.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run. Dependencies listed in `after` run first.
    ///
    /// With no names, every task in the config runs in dependency order.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Xctask.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `XCTASK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the command lines that would run, without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// List configured tasks and exit.
    #[arg(long)]
    pub list: bool,
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
