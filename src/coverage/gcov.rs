// src/coverage/gcov.rs

//! gcov-style text rendering of parsed coverage.

use std::fmt::Write as _;
use std::path::Path;

use uuid::Uuid;

use crate::coverage::parse::{COLUMN_WIDTH, CoverageLineRecord};

pub const REPORT_EXTENSION: &str = "gcov";

/// Length of the random prefix that keeps report names from colliding when
/// several targets or sources share an artifact name.
const REPORT_ID_LEN: usize = 8;

/// Header line naming the source file.
pub fn source_header(source: &str) -> String {
    format!("-----:{:>width$}:Source:{}", 0, source, width = COLUMN_WIDTH)
}

/// One `count:line:text` row.
pub fn render_record(record: &CoverageLineRecord) -> String {
    format!(
        "{}:{:>width$}:{}",
        record.count,
        record.line,
        record.text,
        width = COLUMN_WIDTH
    )
}

/// Full report body for one source file, newline-terminated.
pub fn render_report(source: &str, records: &[CoverageLineRecord]) -> String {
    let mut out = source_header(source);
    out.push('\n');
    for record in records {
        let _ = writeln!(out, "{}", render_record(record));
    }
    out
}

pub fn random_report_id() -> String {
    Uuid::new_v4().simple().to_string()[..REPORT_ID_LEN].to_string()
}

/// `<id>-<artifact base name>.gcov`
pub fn report_file_name(id: &str, artifact: &Path) -> String {
    let base = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "coverage".to_string());
    format!("{id}-{base}.{REPORT_EXTENSION}")
}
