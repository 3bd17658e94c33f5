// tests/coverage_report.rs
mod common;
use crate::common::{TestResult, init_tracing};

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use xctask::coverage::report::{artifact_name, select_coverage_targets};
use xctask::coverage::{CoverageReportGenerator, ToolPaths};
use xctask::errors::XctaskError;
use xctask::fs::FileSystem;
use xctask::fs::mock::MockFileSystem;
use xctask::settings::parse_build_settings;
use xctask_test_utils::fake_tool::FakeToolBackend;

const OBJROOT: &str = "/dd/Build/Intermediates.noindex";
const ARTIFACT: &str = "/dd/Build/Intermediates.noindex/App.build/Debug-iphonesimulator/App.app/App";
const PROFDATA: &str = "/dd/Build/Intermediates.noindex/CodeCoverage/Coverage.profdata";

fn settings_text(extra_target: &str) -> String {
    format!(
        "\
Build settings for action test and target App:
    EXECUTABLE_NAME = App
    EXECUTABLE_PATH = App.app/App
    OBJROOT = {OBJROOT}
    PRODUCT_TYPE = com.apple.product-type.application

Build settings for action test and target AppTests:
    EXECUTABLE_NAME = AppTests
    OBJROOT = {OBJROOT}
    PRODUCT_TYPE = com.apple.product-type.bundle.unit-test
{extra_target}"
    )
}

const SHOW_OUTPUT: &str = "\
\"/src/App/Foo.swift\":
    1|    1|import Foundation
     |    2|
    0|    3|func unused() {}
/src/App/Bar.swift:
    5|    1|let bar = 1
";

const REPORT_OUTPUT: &str = "\
Filename                      Regions    Missed Regions     Cover
---------------------------------------------------------------
/src/App/Foo.swift                  2                 1    50.00%
";

fn mock_build_tree() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/dd/Build/Intermediates.noindex/App.build/Debug-iphonesimulator/App.build/Objects-normal/App.o",
        b"obj".to_vec(),
    );
    fs.add_file(ARTIFACT, b"binary".to_vec());
    fs.add_file(PROFDATA, b"profdata".to_vec());
    fs
}

fn generator(backend: &FakeToolBackend, fs: &MockFileSystem) -> CoverageReportGenerator {
    CoverageReportGenerator::new(
        Arc::new(backend.clone()),
        Arc::new(fs.clone()),
        ToolPaths::default(),
    )
}

#[tokio::test]
async fn writes_one_gcov_file_per_source_next_to_the_database() -> TestResult {
    init_tracing();

    let backend = FakeToolBackend::new()
        .respond("-showBuildSettings", &settings_text(""))
        .respond("report", REPORT_OUTPUT)
        .respond("show", SHOW_OUTPUT);
    let fs = mock_build_tree();

    let options = vec!["-scheme".to_string(), "App".to_string()];
    let summary = generator(&backend, &fs).generate(&options, "iphonesimulator").await?;

    assert!(summary.skipped.is_empty());
    assert_eq!(summary.reports.len(), 1);
    let report = &summary.reports[0];
    assert_eq!(report.target, "App");
    assert_eq!(report.artifact, PathBuf::from(ARTIFACT));
    assert_eq!(report.database, PathBuf::from(PROFDATA));
    assert_eq!(report.files.len(), 2);
    assert_eq!(summary.files_written(), 2);

    let coverage_dir = PathBuf::from("/dd/Build/Intermediates.noindex/CodeCoverage");
    for file in &report.files {
        assert_eq!(file.parent(), Some(coverage_dir.as_path()));
        let name = file.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-App.gcov"), "unexpected report name {name}");
    }
    assert_ne!(report.files[0], report.files[1]);

    let foo = fs.read_to_string(&report.files[0])?;
    assert_eq!(
        foo,
        "-----:    0:Source:/src/App/Foo.swift\n    1:    1:import Foundation\n    -:    2:\n#####:    3:func unused() {}\n"
    );
    let bar = fs.read_to_string(&report.files[1])?;
    assert_eq!(bar, "-----:    0:Source:/src/App/Bar.swift\n    5:    1:let bar = 1\n");

    // The database plus two reports.
    assert_eq!(fs.files_under(&coverage_dir).len(), 3);

    Ok(())
}

#[tokio::test]
async fn toolchain_is_invoked_with_database_and_artifact() -> TestResult {
    init_tracing();

    let backend = FakeToolBackend::new()
        .respond("-showBuildSettings", &settings_text(""))
        .respond("show", SHOW_OUTPUT);
    let fs = mock_build_tree();

    let options = vec!["-scheme".to_string(), "App".to_string()];
    generator(&backend, &fs).generate(&options, "iphonesimulator").await?;

    let calls = backend.calls();
    assert_eq!(calls.len(), 3);

    assert_eq!(calls[0].program, "xcodebuild");
    assert_eq!(calls[0].args, vec!["test", "-scheme", "App", "-showBuildSettings"]);

    for (call, subcommand) in calls[1..].iter().zip(["report", "show"]) {
        assert_eq!(call.program, "xcrun");
        assert_eq!(
            call.args,
            vec!["llvm-cov", subcommand, "-instr-profile", PROFDATA, ARTIFACT, "-use-color=0"]
        );
    }

    Ok(())
}

#[tokio::test]
async fn unsupported_product_type_names_the_type() {
    init_tracing();

    let extra = "\
Build settings for action test and target Widget:
    OBJROOT = /dd/Build/Intermediates.noindex
    PRODUCT_TYPE = com.apple.product-type.app-extension
";
    let backend = FakeToolBackend::new().respond("-showBuildSettings", &settings_text(extra));
    let fs = mock_build_tree();

    let err = generator(&backend, &fs)
        .generate(&[], "iphonesimulator")
        .await
        .expect_err("app extensions are not supported");

    match &err {
        XctaskError::UnsupportedProductType(t) => {
            assert_eq!(t, "com.apple.product-type.app-extension")
        }
        other => panic!("Expected UnsupportedProductType, got: {:?}", other),
    }
    assert!(err.to_string().contains("com.apple.product-type.app-extension"));
}

#[tokio::test]
async fn missing_artifact_skips_the_target() -> TestResult {
    init_tracing();

    let backend = FakeToolBackend::new()
        .respond("-showBuildSettings", &settings_text(""))
        .respond("show", SHOW_OUTPUT);
    let fs = MockFileSystem::new();
    fs.add_file(PROFDATA, b"profdata".to_vec());

    let summary = generator(&backend, &fs).generate(&[], "iphonesimulator").await?;

    assert!(summary.reports.is_empty());
    assert_eq!(summary.skipped, vec!["App".to_string()]);
    // Only the settings query ran.
    assert_eq!(backend.calls().len(), 1);
    assert_eq!(fs.files_under("/dd").len(), 1);

    Ok(())
}

#[test]
fn unit_test_bundles_are_never_selected() {
    let table = parse_build_settings(&settings_text(
        "\
Build settings for action test and target AppUITests:
    PRODUCT_TYPE = com.apple.product-type.bundle.ui-testing
Build settings for action test and target Core:
    PRODUCT_TYPE = com.apple.product-type.framework
",
    ));

    let selected: Vec<&str> = select_coverage_targets(&table)
        .into_iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(selected, vec!["App", "Core"]);
}

fn framework_settings() -> IndexMap<String, String> {
    let mut s = IndexMap::new();
    s.insert(
        "PRODUCT_TYPE".to_string(),
        "com.apple.product-type.framework".to_string(),
    );
    s.insert("EXECUTABLE_NAME".to_string(), "Core".to_string());
    s.insert("EXECUTABLE_PATH".to_string(), "Core.framework/Core".to_string());
    s.insert("ONLY_ACTIVE_ARCH".to_string(), "NO".to_string());
    s
}

#[test]
fn framework_artifact_depends_on_sdk_and_active_arch() -> TestResult {
    let mut settings = framework_settings();

    assert_eq!(artifact_name(&settings, "iphoneos")?, "Core.framework/Core");
    assert_eq!(artifact_name(&settings, "iphoneos17.2")?, "Core.framework/Core");
    assert_eq!(artifact_name(&settings, "iphonesimulator")?, "Core");

    settings.insert("ONLY_ACTIVE_ARCH".to_string(), "YES".to_string());
    assert_eq!(artifact_name(&settings, "iphoneos")?, "Core");

    Ok(())
}

#[test]
fn application_artifact_uses_executable_path() -> TestResult {
    let mut settings = framework_settings();
    settings.insert(
        "PRODUCT_TYPE".to_string(),
        "com.apple.product-type.application".to_string(),
    );

    assert_eq!(artifact_name(&settings, "iphonesimulator")?, "Core.framework/Core");
    assert_eq!(artifact_name(&settings, "macosx")?, "Core.framework/Core");

    Ok(())
}

#[test]
fn missing_product_type_is_unsupported() {
    let settings = IndexMap::new();
    assert!(matches!(
        artifact_name(&settings, "iphonesimulator"),
        Err(XctaskError::UnsupportedProductType(t)) if t.is_empty()
    ));
}
