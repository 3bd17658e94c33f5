// src/coverage/mod.rs

//! Coverage reporting for test runs built with `-enableCodeCoverage YES`.
//!
//! - [`parse`] turns `llvm-cov show` output into per-source records.
//! - [`gcov`] renders records in gcov text form.
//! - [`report`] drives the toolchain per build target and writes the files.

pub mod gcov;
pub mod parse;
pub mod report;

pub use parse::{CoverageFile, CoverageLineRecord, ExecutionCount, parse_annotated_source};
pub use report::{CoverageReportGenerator, CoverageSummary, TargetReport, ToolPaths};
