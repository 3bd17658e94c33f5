// src/lib.rs

pub mod args;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod settings;
pub mod tasks;
pub mod types;

use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::errors::Result;
use crate::exec::RealToolBackend;
use crate::fs::RealFileSystem;
use crate::tasks::{TaskExecutor, execution_order, print_dry_run, print_task_list};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, then lists, dry-runs, or runs the
/// requested tasks in dependency order. The first failing task ends the run.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    debug!(config = %args.config, tasks = cfg.tasks().len(), "config loaded");

    if args.list {
        print_task_list(&cfg);
        return Ok(());
    }

    if args.dry_run {
        let order = execution_order(&cfg, &args.tasks)?;
        print_dry_run(&cfg, &order);
        return Ok(());
    }

    let executor = TaskExecutor::new(cfg, Arc::new(RealToolBackend), Arc::new(RealFileSystem));
    let results = executor.run_tasks(&args.tasks).await?;

    info!(completed = results.len(), "all tasks finished");
    Ok(())
}
