// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::errors::{Result, XctaskError};
use crate::types::Action;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::XctaskError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.tool, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    for (name, task) in cfg.task.iter() {
        validate_task_attributes(name, task)?;
    }
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(XctaskError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

/// Attribute combinations `xcodebuild` rejects (or that make no sense for the
/// action) are reported here, before any process is launched.
pub fn validate_task_attributes(name: &str, task: &TaskConfig) -> Result<()> {
    let fail = |msg: &str| -> Result<()> {
        Err(XctaskError::ConfigError(format!("task '{name}': {msg}")))
    };

    if task.project.is_some() && task.workspace.is_some() {
        return fail("`project` and `workspace` are mutually exclusive");
    }
    if task.workspace.is_some() && task.scheme.is_none() {
        return fail("`workspace` requires `scheme`");
    }

    if task.action.runs_tests() {
        if task.scheme.is_none() {
            return fail("test actions require `scheme`");
        }
    } else {
        if task.coverage {
            return fail("`coverage` is only valid for test actions");
        }
        if !task.only_testing.is_empty() || !task.skip_testing.is_empty() {
            return fail("`only_testing`/`skip_testing` are only valid for test actions");
        }
    }

    match task.action {
        Action::Archive => {
            if task.scheme.is_none() {
                return fail("`archive` requires `scheme`");
            }
            if task.archive_path.is_none() {
                return fail("`archive` requires `archive_path`");
            }
        }
        Action::Export => {
            if task.archive_path.is_none()
                || task.export_path.is_none()
                || task.export_options_plist.is_none()
            {
                return fail(
                    "`export` requires `archive_path`, `export_path` and `export_options_plist`",
                );
            }
        }
        _ => {}
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(XctaskError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(XctaskError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(XctaskError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                node
            )))
        }
    }
}
