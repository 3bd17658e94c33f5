// src/tasks.rs

//! Running configured tasks: dependency ordering, the primary build tool
//! invocation with its hooks, and the coverage step for test tasks.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{info, warn};

use crate::args::{assemble_args, coverage_options};
use crate::config::{ConfigFile, TaskConfig};
use crate::coverage::{CoverageReportGenerator, CoverageSummary, ToolPaths};
use crate::errors::{Result, XctaskError};
use crate::exec::{CommandRunner, CommandSpec, ExecutionOutcome, RunnerHooks, ToolBackend};
use crate::fs::FileSystem;
use crate::types::Action;

/// Resolve `requested` (or every task when empty) plus their transitive
/// `after` dependencies into a run order where dependencies come first.
pub fn execution_order(cfg: &ConfigFile, requested: &[String]) -> Result<Vec<String>> {
    let roots: Vec<&str> = if requested.is_empty() {
        cfg.tasks().keys().map(String::as_str).collect()
    } else {
        requested.iter().map(String::as_str).collect()
    };

    let mut needed: BTreeSet<&str> = BTreeSet::new();
    let mut stack = roots;
    while let Some(name) = stack.pop() {
        let task = cfg
            .task(name)
            .ok_or_else(|| XctaskError::TaskNotFound(name.to_string()))?;
        if needed.insert(name) {
            stack.extend(task.after.iter().map(String::as_str));
        }
    }

    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for &name in &needed {
        graph.add_node(name);
        if let Some(task) = cfg.task(name) {
            for dep in &task.after {
                graph.add_edge(dep.as_str(), name, ());
            }
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        XctaskError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))
    })?;

    Ok(order.into_iter().map(str::to_string).collect())
}

/// The primary invocation of a task.
pub fn command_spec(cfg: &ConfigFile, task: &TaskConfig) -> CommandSpec {
    CommandSpec::new(cfg.tool().xcodebuild.clone())
        .args(assemble_args(task))
        .clear_env(cfg.tool().clear_env)
}

/// Runs tasks from a validated config against a tool backend and filesystem.
pub struct TaskExecutor {
    cfg: ConfigFile,
    backend: Arc<dyn ToolBackend>,
    fs: Arc<dyn FileSystem>,
}

/// What a single task produced.
#[derive(Debug)]
pub struct TaskResult {
    pub name: String,
    pub outcome: ExecutionOutcome,
    pub coverage: Option<CoverageSummary>,
}

impl TaskExecutor {
    pub fn new(cfg: ConfigFile, backend: Arc<dyn ToolBackend>, fs: Arc<dyn FileSystem>) -> Self {
        Self { cfg, backend, fs }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.cfg
    }

    /// Run the named tasks (with dependencies) in order, stopping at the
    /// first failure.
    pub async fn run_tasks(&self, requested: &[String]) -> Result<Vec<TaskResult>> {
        let order = execution_order(&self.cfg, requested)?;
        info!(?order, "task execution order");

        let mut results = Vec::with_capacity(order.len());
        for name in order {
            results.push(self.run_task(&name).await?);
        }
        Ok(results)
    }

    /// Run one task without its dependencies.
    pub async fn run_task(&self, name: &str) -> Result<TaskResult> {
        let task = self
            .cfg
            .task(name)
            .ok_or_else(|| XctaskError::TaskNotFound(name.to_string()))?;

        info!(task = %name, action = %task.action, "running task");

        let spec = command_spec(&self.cfg, task);
        let formatter = self.cfg.formatter_for(task);
        let runner = CommandRunner::new(self.hooks_for(name, task));

        let outcome = runner.execute(&spec, formatter.as_deref()).await?;

        let coverage = if task.coverage && task.action.runs_tests() {
            let generator = CoverageReportGenerator::new(
                Arc::clone(&self.backend),
                Arc::clone(&self.fs),
                ToolPaths {
                    xcodebuild: self.cfg.tool().xcodebuild.clone(),
                    xcrun: self.cfg.tool().xcrun.clone(),
                },
            );
            let sdk = task.sdk.as_deref().unwrap_or_default();
            Some(generator.generate(&coverage_options(task), sdk).await?)
        } else {
            None
        };

        Ok(TaskResult {
            name: name.to_string(),
            outcome,
            coverage,
        })
    }

    fn hooks_for(&self, name: &str, task: &TaskConfig) -> RunnerHooks {
        let mut hooks = RunnerHooks::new();

        if !task.clean_dirs.is_empty() {
            let fs = Arc::clone(&self.fs);
            let dirs: Vec<PathBuf> = task.clean_dirs.iter().map(PathBuf::from).collect();
            let task_name = name.to_string();
            hooks = hooks.before(move || {
                for dir in &dirs {
                    match fs.remove_dir_all(dir) {
                        Ok(()) => info!(task = %task_name, dir = %dir.display(), "removed directory"),
                        Err(e) => warn!(
                            task = %task_name,
                            dir = %dir.display(),
                            error = %e,
                            "failed to remove directory"
                        ),
                    }
                }
            });
        }

        let task_name = name.to_string();
        let produced = produced_path(task);
        hooks.after(move |lines, status| {
            info!(
                task = %task_name,
                exit_code = status.code,
                lines = lines.len(),
                "task succeeded"
            );
            if let Some((what, path)) = &produced {
                println!("{what} written to {path}");
            }
        })
    }
}

/// Archive and export tasks leave a product on disk worth pointing at.
fn produced_path(task: &TaskConfig) -> Option<(&'static str, String)> {
    match task.action {
        Action::Archive => task.archive_path.clone().map(|p| ("Archive", p)),
        Action::Export => task.export_path.clone().map(|p| ("Export", p)),
        _ => None,
    }
}

/// Print what would run, without running anything.
pub fn print_dry_run(cfg: &ConfigFile, order: &[String]) {
    println!("xctask dry-run");
    for name in order {
        let Some(task) = cfg.task(name) else {
            continue;
        };
        let formatter = cfg.formatter_for(task);
        let spec = command_spec(cfg, task);
        println!("  - {name} ({})", task.action);
        println!("      cmd: {}", spec.display_line(formatter.as_deref()));
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if task.coverage {
            println!("      coverage: true");
        }
        if !task.clean_dirs.is_empty() {
            println!("      clean_dirs: {:?}", task.clean_dirs);
        }
    }
}

pub fn print_task_list(cfg: &ConfigFile) {
    for (name, task) in cfg.tasks() {
        println!("{name}\t{}", task.action);
    }
}
