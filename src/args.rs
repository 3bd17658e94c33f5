// src/args.rs

//! Mapping from task attributes to `xcodebuild` flags.
//!
//! The relative order of flag categories is fixed: action, project/target/
//! workspace/scheme/sdk/configuration, coverage, derived data, destinations,
//! test filters, archive/export paths, then `KEY=value` build settings.

use crate::config::TaskConfig;

/// Full argument list for the task's primary invocation, action first.
pub fn assemble_args(task: &TaskConfig) -> Vec<String> {
    let mut args = vec![task.action.as_arg().to_string()];
    push_selection_flags(&mut args, task);
    push_archive_flags(&mut args, task);
    push_build_settings(&mut args, task);
    args
}

/// Options shared with the follow-up `-showBuildSettings` invocation of a
/// coverage run: everything except the action word and archive/export paths.
pub fn coverage_options(task: &TaskConfig) -> Vec<String> {
    let mut args = Vec::new();
    push_selection_flags(&mut args, task);
    push_build_settings(&mut args, task);
    args
}

fn push_selection_flags(args: &mut Vec<String>, task: &TaskConfig) {
    push_opt(args, "-project", task.project.as_deref());
    push_opt(args, "-target", task.target.as_deref());
    push_opt(args, "-workspace", task.workspace.as_deref());
    push_opt(args, "-scheme", task.scheme.as_deref());
    push_opt(args, "-sdk", task.sdk.as_deref());
    push_opt(args, "-configuration", task.configuration.as_deref());

    if task.coverage && task.action.runs_tests() {
        args.push("-enableCodeCoverage".to_string());
        args.push("YES".to_string());
    }

    push_opt(args, "-derivedDataPath", task.derived_data_path.as_deref());

    for destination in &task.destinations {
        args.push("-destination".to_string());
        args.push(destination.clone());
    }

    for id in &task.only_testing {
        args.push(format!("-only-testing:{id}"));
    }
    for id in &task.skip_testing {
        args.push(format!("-skip-testing:{id}"));
    }
}

fn push_archive_flags(args: &mut Vec<String>, task: &TaskConfig) {
    push_opt(args, "-archivePath", task.archive_path.as_deref());
    push_opt(args, "-exportPath", task.export_path.as_deref());
    push_opt(args, "-exportOptionsPlist", task.export_options_plist.as_deref());
}

fn push_build_settings(args: &mut Vec<String>, task: &TaskConfig) {
    // BTreeMap iteration keeps these sorted by key.
    for (key, value) in &task.build_settings {
        args.push(format!("{key}={value}"));
    }
}

fn push_opt(args: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}
