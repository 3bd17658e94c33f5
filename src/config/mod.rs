// src/config/mod.rs

//! Configuration loading and validation for xctask.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: attribute combinations and task dependency checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigFile, RawConfigFile, TaskConfig, ToolSection};
pub use validate::validate_task_attributes;
