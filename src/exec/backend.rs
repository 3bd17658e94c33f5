// src/exec/backend.rs

//! Pluggable backend for the buffered (non-streaming) tool invocations.
//!
//! The coverage step asks the toolchain three questions per run (build
//! settings, coverage summary, annotated sources) and parses the answers.
//! It talks to a [`ToolBackend`] instead of spawning processes itself, so
//! tests can hand it canned output.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{Result, XctaskError};

/// Trait abstracting how a command's output is captured.
pub trait ToolBackend: Send + Sync {
    /// Run `program` with `args` to completion and return its stdout.
    ///
    /// Only a failure to launch is an error; the exit status is not judged.
    fn capture<'a>(
        &'a self,
        program: &'a str,
        args: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Backend that spawns real processes.
#[derive(Debug, Clone, Default)]
pub struct RealToolBackend;

impl ToolBackend for RealToolBackend {
    fn capture<'a>(
        &'a self,
        program: &'a str,
        args: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            debug!(program, ?args, "capturing tool output");

            let output = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|source| XctaskError::Spawn {
                    program: program.to_string(),
                    source,
                })?;

            if !output.status.success() {
                debug!(
                    program,
                    exit_code = output.status.code().unwrap_or(-1),
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "captured tool exited unsuccessfully"
                );
            }

            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
    }
}
