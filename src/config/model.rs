// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::Action;

/// Configuration exactly as deserialized from `Xctask.toml`.
///
/// ```toml
/// [tool]
/// formatter = "xcpretty"
///
/// [task.test]
/// action = "test"
/// workspace = "App.xcworkspace"
/// scheme = "App"
/// sdk = "iphonesimulator"
/// coverage = true
/// ```
///
/// Use [`ConfigFile::try_from`] to obtain a validated [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub tool: ToolSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Only constructible through validation.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    tool: ToolSection,
    task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(tool: ToolSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { tool, task }
    }

    pub fn tool(&self) -> &ToolSection {
        &self.tool
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.get(name)
    }

    /// Formatter command for a task: the task's own, else `[tool].formatter`.
    pub fn formatter_for(&self, task: &TaskConfig) -> Option<String> {
        task.formatter.clone().or_else(|| self.tool.formatter.clone())
    }
}

/// `[tool]` section: where the external tools live and how they run.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSection {
    #[serde(default = "default_xcodebuild")]
    pub xcodebuild: String,

    /// Used to reach `llvm-cov` for coverage reports.
    #[serde(default = "default_xcrun")]
    pub xcrun: String,

    /// Default formatter command (e.g. `"xcpretty"`), piped after the build
    /// tool's stdout.
    #[serde(default)]
    pub formatter: Option<String>,

    /// Start the build tool with an empty environment plus the unbuffered-IO
    /// marker.
    #[serde(default)]
    pub clear_env: bool,
}

fn default_xcodebuild() -> String {
    "xcodebuild".to_string()
}

fn default_xcrun() -> String {
    "xcrun".to_string()
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            xcodebuild: default_xcodebuild(),
            xcrun: default_xcrun(),
            formatter: None,
            clear_env: false,
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub action: Action,

    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub workspace: Option<String>,

    #[serde(default)]
    pub scheme: Option<String>,

    #[serde(default)]
    pub sdk: Option<String>,

    #[serde(default)]
    pub configuration: Option<String>,

    /// Adds `-enableCodeCoverage YES` and runs the coverage report after a
    /// successful test run.
    #[serde(default)]
    pub coverage: bool,

    #[serde(default)]
    pub derived_data_path: Option<String>,

    #[serde(default)]
    pub destinations: Vec<String>,

    #[serde(default)]
    pub only_testing: Vec<String>,

    #[serde(default)]
    pub skip_testing: Vec<String>,

    /// Arbitrary `KEY=value` overrides.
    #[serde(default)]
    pub build_settings: BTreeMap<String, String>,

    #[serde(default)]
    pub archive_path: Option<String>,

    #[serde(default)]
    pub export_path: Option<String>,

    #[serde(default)]
    pub export_options_plist: Option<String>,

    /// Overrides `[tool].formatter` for this task.
    #[serde(default)]
    pub formatter: Option<String>,

    /// Directories removed right before the build tool starts.
    #[serde(default)]
    pub clean_dirs: Vec<String>,

    /// Tasks that must run (successfully) before this one.
    #[serde(default)]
    pub after: Vec<String>,
}
