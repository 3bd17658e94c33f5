// src/coverage/report.rs

//! Per-target coverage report generation.
//!
//! For every non-test target of a coverage-enabled test run:
//! 1. locate the compiled artifact and `Coverage.profdata` under `OBJROOT`,
//! 2. print `llvm-cov report` for the pair,
//! 3. parse `llvm-cov show` and write one gcov file per source next to the
//!    coverage database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::coverage::gcov::{random_report_id, render_report, report_file_name};
use crate::coverage::parse::parse_annotated_source;
use crate::errors::{Result, XctaskError};
use crate::exec::ToolBackend;
use crate::fs::{FileSystem, find_file_ending_with};
use crate::settings::{BuildSettingsTable, fetch_build_settings};
use crate::types::{ProductType, is_device_sdk};

pub const COVERAGE_DATABASE_NAME: &str = "Coverage.profdata";

/// Where to find the external tools.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub xcodebuild: String,
    pub xcrun: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            xcodebuild: "xcodebuild".to_string(),
            xcrun: "xcrun".to_string(),
        }
    }
}

/// Reports written for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub target: String,
    pub artifact: PathBuf,
    pub database: PathBuf,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub reports: Vec<TargetReport>,
    /// Targets whose artifact or coverage database could not be found.
    pub skipped: Vec<String>,
}

impl CoverageSummary {
    pub fn files_written(&self) -> usize {
        self.reports.iter().map(|r| r.files.len()).sum()
    }
}

pub struct CoverageReportGenerator {
    backend: Arc<dyn ToolBackend>,
    fs: Arc<dyn FileSystem>,
    tools: ToolPaths,
}

impl CoverageReportGenerator {
    pub fn new(backend: Arc<dyn ToolBackend>, fs: Arc<dyn FileSystem>, tools: ToolPaths) -> Self {
        Self { backend, fs, tools }
    }

    /// Generate gcov reports for the test run described by `options`.
    ///
    /// `options` are the same project/scheme/destination flags the test run
    /// used (without the action word); `sdk` decides which executable
    /// setting identifies a framework's binary.
    pub async fn generate(&self, options: &[String], sdk: &str) -> Result<CoverageSummary> {
        let settings =
            fetch_build_settings(self.backend.as_ref(), &self.tools.xcodebuild, options).await?;

        let mut summary = CoverageSummary::default();

        for (target, target_settings) in select_coverage_targets(&settings) {
            let artifact_name = artifact_name(target_settings, sdk)?;
            let obj_root = PathBuf::from(
                target_settings
                    .get("OBJROOT")
                    .map(String::as_str)
                    .unwrap_or_default(),
            );

            let artifact = find_file_ending_with(self.fs.as_ref(), &obj_root, &artifact_name)?;
            let database =
                find_file_ending_with(self.fs.as_ref(), &obj_root, COVERAGE_DATABASE_NAME)?;

            let (Some(artifact), Some(database)) = (artifact, database) else {
                warn!(
                    target = %target,
                    obj_root = %obj_root.display(),
                    artifact = %artifact_name,
                    "coverage artifact or database not found; skipping target"
                );
                summary.skipped.push(target.clone());
                continue;
            };

            info!(
                target = %target,
                artifact = %artifact.display(),
                database = %database.display(),
                "generating coverage for target"
            );

            self.show_summary(&database, &artifact).await?;
            let files = self.write_gcov_files(&database, &artifact).await?;

            summary.reports.push(TargetReport {
                target: target.clone(),
                artifact,
                database,
                files,
            });
        }

        println!(
            "Coverage: wrote {} gcov file(s) for {} target(s)",
            summary.files_written(),
            summary.reports.len()
        );
        if !summary.skipped.is_empty() {
            println!("Coverage: skipped {}", summary.skipped.join(", "));
        }

        Ok(summary)
    }

    /// Print `llvm-cov report` verbatim.
    async fn show_summary(&self, database: &Path, artifact: &Path) -> Result<()> {
        let args = llvm_cov_args("report", database, artifact);
        println!("{} {}", self.tools.xcrun, args.join(" "));

        let text = self.backend.capture(&self.tools.xcrun, &args).await?;
        for line in text.lines() {
            println!("{line}");
        }
        Ok(())
    }

    /// Parse `llvm-cov show` and write one gcov file per source into the
    /// database's directory.
    async fn write_gcov_files(&self, database: &Path, artifact: &Path) -> Result<Vec<PathBuf>> {
        println!("Generating gcov files...");

        let args = llvm_cov_args("show", database, artifact);
        let text = self.backend.capture(&self.tools.xcrun, &args).await?;
        let coverage = parse_annotated_source(&text);

        let out_dir = database.parent().unwrap_or_else(|| Path::new("."));
        let mut written = Vec::with_capacity(coverage.len());

        for (source, records) in coverage.iter() {
            let path = out_dir.join(report_file_name(&random_report_id(), artifact));
            let body = render_report(source, records);
            self.fs.write(&path, body.as_bytes())?;
            debug!(source = %source, report = %path.display(), records = records.len(), "wrote gcov file");
            written.push(path);
        }

        Ok(written)
    }
}

/// Every target except test bundles, in settings order.
pub fn select_coverage_targets(
    settings: &BuildSettingsTable,
) -> Vec<(&String, &IndexMap<String, String>)> {
    settings
        .iter()
        .filter(|(_, s)| !product_type_of(s).is_test_bundle())
        .collect()
}

/// The setting value naming the target's binary.
///
/// Frameworks built for a device SDK with `ONLY_ACTIVE_ARCH = NO` are matched
/// by `EXECUTABLE_PATH` (the binary inside the bundle), otherwise by
/// `EXECUTABLE_NAME`. Applications always use `EXECUTABLE_PATH`. Any other
/// product type is rejected.
pub fn artifact_name(settings: &IndexMap<String, String>, sdk: &str) -> Result<String> {
    let universal = is_device_sdk(sdk)
        && settings
            .get("ONLY_ACTIVE_ARCH")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("NO"));

    let key = match product_type_of(settings) {
        ProductType::Framework if universal => "EXECUTABLE_PATH",
        ProductType::Framework => "EXECUTABLE_NAME",
        ProductType::Application => "EXECUTABLE_PATH",
        other => {
            return Err(XctaskError::UnsupportedProductType(
                other.as_str().to_string(),
            ));
        }
    };

    Ok(settings.get(key).cloned().unwrap_or_default())
}

fn product_type_of(settings: &IndexMap<String, String>) -> ProductType {
    ProductType::parse(settings.get("PRODUCT_TYPE").map(String::as_str).unwrap_or(""))
}

fn llvm_cov_args(subcommand: &str, database: &Path, artifact: &Path) -> Vec<String> {
    vec![
        "llvm-cov".to_string(),
        subcommand.to_string(),
        "-instr-profile".to_string(),
        database.display().to_string(),
        artifact.display().to_string(),
        "-use-color=0".to_string(),
    ]
}
