// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] holds the invocation and result values (`CommandSpec`,
//!   `ExecutionOutcome`).
//! - [`runner`] streams the primary build tool run to the console, optionally
//!   through a formatter process, and resolves success from the build tool's
//!   exit status.
//! - [`backend`] provides the `ToolBackend` trait used for buffered captures,
//!   with a `RealToolBackend` for production and room for fakes in tests.

pub mod backend;
pub mod command;
pub mod runner;

pub use backend::{RealToolBackend, ToolBackend};
pub use command::{CommandSpec, ExecutionOutcome, ExitInfo, UNBUFFERED_IO_ENV};
pub use runner::{CommandRunner, RunnerHooks};
