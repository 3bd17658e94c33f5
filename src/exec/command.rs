// src/exec/command.rs

//! Values describing one build tool invocation and its result.

use std::collections::BTreeMap;
use std::process::ExitStatus;

/// Environment variable that makes Foundation-based tools flush output line by
/// line instead of at exit.
pub const UNBUFFERED_IO_ENV: (&str, &str) = ("NSUnbufferedIO", "YES");

/// An immutable command line plus its environment policy.
///
/// `argv[0]` is the program. Builder methods consume `self`, so a spec is
/// fixed once handed to the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    argv: Vec<String>,
    env: BTreeMap<String, String>,
    clear_env: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
            env: BTreeMap::new(),
            clear_env: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Drop every inherited variable; the child only sees [`Self::env`]
    /// overrides.
    pub fn clear_env(mut self, clear: bool) -> Self {
        self.clear_env = clear;
        self
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn arguments(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn clears_env(&self) -> bool {
        self.clear_env
    }

    /// The command line as printed to the console: `argv` joined by spaces.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Console rendering including the formatter, if any.
    pub fn display_line(&self, formatter: Option<&str>) -> String {
        match formatter {
            Some(f) => format!("{} | {}", self.command_line(), f),
            None => self.command_line(),
        }
    }
}

/// Exit status of the primary process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    pub success: bool,
    /// `-1` when the process was terminated by a signal.
    pub code: i32,
}

impl From<ExitStatus> for ExitInfo {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code().unwrap_or(-1),
        }
    }
}

/// Status plus every line streamed to the console, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub status: ExitInfo,
    pub lines: Vec<String>,
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.status.success
    }
}
