// src/coverage/parse.rs

//! Parser for `llvm-cov show` annotated-source output.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::trace;

use crate::settings::unquote;

/// Width of the count and line-number columns.
pub const COLUMN_WIDTH: usize = 5;

/// How many times a source line ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionCount {
    /// The line carries no instrumentation (blank count column).
    NotExecutable,
    /// Instrumented but never reached.
    NeverExecuted,
    Count(u64),
}

impl ExecutionCount {
    /// Interpret the raw count column. Blank means not executable, `0` means
    /// never executed. Counts too large for `u64` saturate.
    pub fn from_column(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return ExecutionCount::NotExecutable;
        }
        match raw.parse::<u64>() {
            Ok(0) => ExecutionCount::NeverExecuted,
            Ok(n) => ExecutionCount::Count(n),
            Err(_) if raw.bytes().all(|b| b.is_ascii_digit()) => ExecutionCount::Count(u64::MAX),
            Err(_) => ExecutionCount::NotExecutable,
        }
    }
}

impl fmt::Display for ExecutionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionCount::NotExecutable => write!(f, "{:>width$}", "-", width = COLUMN_WIDTH),
            ExecutionCount::NeverExecuted => f.write_str("#####"),
            ExecutionCount::Count(n) => write!(f, "{:>width$}", n, width = COLUMN_WIDTH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageLineRecord {
    pub count: ExecutionCount,
    /// 1-based.
    pub line: u32,
    pub text: String,
}

/// Source path -> records in the order `llvm-cov` printed them.
pub type CoverageFile = IndexMap<String, Vec<CoverageLineRecord>>;

static SOURCE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(['"]?(?:/[^/]+)*['"]?):$"#).expect("source header regex is valid")
});

static LINE_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d*)\s*\|\s*(\d+)\s*\|(.*)$").expect("line record regex is valid")
});

/// Line-scanner state: records only accumulate inside a source section.
enum Section {
    None,
    Source(String),
}

/// Parse annotated-source text into per-file records.
///
/// A `"/path/to/File.swift":` line opens a section (re-opening a path starts
/// it over). `count | line | text` lines append to the open section. Anything
/// else is skipped.
pub fn parse_annotated_source(text: &str) -> CoverageFile {
    let mut files = CoverageFile::new();
    let mut section = Section::None;

    for raw in text.lines() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(caps) = SOURCE_HEADER.captures(line) {
            let path = unquote(&caps[1]).to_string();
            files.insert(path.clone(), Vec::new());
            section = Section::Source(path);
            continue;
        }

        let Some(caps) = LINE_RECORD.captures(line) else {
            trace!(line, "coverage line not recognised; skipped");
            continue;
        };

        let Section::Source(path) = &section else {
            trace!(line, "coverage record before any source header; skipped");
            continue;
        };

        let Ok(number) = caps[2].parse::<u32>() else {
            trace!(line, "coverage line number out of range; skipped");
            continue;
        };

        if let Some(records) = files.get_mut(path) {
            records.push(CoverageLineRecord {
                count: ExecutionCount::from_column(&caps[1]),
                line: number,
                text: caps[3].to_string(),
            });
        }
    }

    files
}
