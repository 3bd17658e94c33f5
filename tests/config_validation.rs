// tests/config_validation.rs
mod common;
use crate::common::{TestResult, init_tracing};

use std::io::Write;

use tempfile::NamedTempFile;
use xctask::config::{ConfigFile, load_and_validate, load_from_str};
use xctask::errors::XctaskError;
use xctask::tasks::execution_order;
use xctask::types::Action;
use xctask_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

#[test]
fn full_config_file_is_parsed() -> TestResult {
    init_tracing();

    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[tool]
formatter = "xcpretty"

[task.test]
action = "test"
workspace = "App.xcworkspace"
scheme = "App"
sdk = "iphonesimulator"
coverage = true
destinations = ["platform=iOS Simulator,name=iPhone 15"]
build_settings = {{ CODE_SIGNING_ALLOWED = "NO" }}
clean_dirs = ["build"]
after = ["build"]

[task.build]
project = "App.xcodeproj"
formatter = "cat"
"#
    )?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.tool().xcodebuild, "xcodebuild");
    assert_eq!(cfg.tool().xcrun, "xcrun");
    assert!(!cfg.tool().clear_env);

    let test = cfg.task("test").expect("task test must exist");
    assert_eq!(test.action, Action::Test);
    assert!(test.coverage);
    assert_eq!(test.build_settings.get("CODE_SIGNING_ALLOWED").map(String::as_str), Some("NO"));
    assert_eq!(cfg.formatter_for(test).as_deref(), Some("xcpretty"));

    let build = cfg.task("build").expect("task build must exist");
    assert_eq!(build.action, Action::Build);
    assert_eq!(cfg.formatter_for(build).as_deref(), Some("cat"));

    Ok(())
}

fn expect_config_error(raw: &str, needle: &str) {
    let parsed = load_from_str(raw).expect("toml should parse");
    match ConfigFile::try_from(parsed) {
        Err(XctaskError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} should contain {needle:?}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn project_and_workspace_are_mutually_exclusive() {
    expect_config_error(
        r#"
[task.build]
project = "App.xcodeproj"
workspace = "App.xcworkspace"
scheme = "App"
"#,
        "mutually exclusive",
    );
}

#[test]
fn workspace_requires_scheme() {
    expect_config_error(
        r#"
[task.build]
workspace = "App.xcworkspace"
"#,
        "requires `scheme`",
    );
}

#[test]
fn coverage_is_rejected_outside_test_actions() {
    expect_config_error(
        r#"
[task.build]
action = "build"
coverage = true
"#,
        "only valid for test actions",
    );
}

#[test]
fn export_requires_all_paths() {
    expect_config_error(
        r#"
[task.export]
action = "export"
archive_path = "App.xcarchive"
"#,
        "export_options_plist",
    );
}

#[test]
fn unknown_dependency_is_reported() {
    expect_config_error(
        r#"
[task.test]
action = "test"
scheme = "App"
after = ["missing"]
"#,
        "missing",
    );
}

#[test]
fn dependency_cycle_returns_structured_error() {
    let raw = load_from_str(
        r#"
[task.a]
after = ["b"]

[task.b]
after = ["a"]
"#,
    )
    .expect("toml should parse");

    match ConfigFile::try_from(raw) {
        Err(XctaskError::DagCycle(msg)) => assert!(msg.contains("cycle detected")),
        Err(e) => panic!("Expected DagCycle, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn invalid_action_is_a_toml_error() {
    let result = load_from_str(
        r#"
[task.a]
action = "deploy"
"#,
    );
    assert!(matches!(result, Err(XctaskError::TomlError(_))));
}

#[test]
fn execution_order_puts_dependencies_first() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_task("lint", TaskConfigBuilder::new(Action::Build).target("Lint").build())
        .with_task(
            "build",
            TaskConfigBuilder::new(Action::Build).target("App").after("lint").build(),
        )
        .with_task("test", TaskConfigBuilder::test("App").after("build").build())
        .with_task("other", TaskConfigBuilder::new(Action::Clean).build())
        .build();

    let order = execution_order(&cfg, &["test".to_string()])?;
    assert_eq!(order, vec!["lint", "build", "test"]);

    let all = execution_order(&cfg, &[])?;
    assert_eq!(all.len(), 4);
    let pos = |n: &str| all.iter().position(|x| x == n).unwrap();
    assert!(pos("lint") < pos("build"));
    assert!(pos("build") < pos("test"));

    Ok(())
}

#[test]
fn unknown_task_name_is_reported() {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", TaskConfigBuilder::new(Action::Build).build())
        .build();

    match execution_order(&cfg, &["nope".to_string()]) {
        Err(XctaskError::TaskNotFound(name)) => assert_eq!(name, "nope"),
        other => panic!("Expected TaskNotFound, got: {:?}", other),
    }
}
