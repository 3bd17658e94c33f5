#![allow(dead_code)]

use std::collections::BTreeMap;

use xctask::config::{ConfigFile, RawConfigFile, TaskConfig, ToolSection};
use xctask::types::Action;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                tool: ToolSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn xcodebuild(mut self, path: &str) -> Self {
        self.config.tool.xcodebuild = path.to_string();
        self
    }

    pub fn xcrun(mut self, path: &str) -> Self {
        self.config.tool.xcrun = path.to_string();
        self
    }

    pub fn formatter(mut self, cmd: &str) -> Self {
        self.config.tool.formatter = Some(cmd.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(action: Action) -> Self {
        Self {
            task: TaskConfig {
                action,
                ..TaskConfig::default()
            },
        }
    }

    /// A test task for scheme `scheme` in `App.xcodeproj`.
    pub fn test(scheme: &str) -> Self {
        Self::new(Action::Test).project("App.xcodeproj").scheme(scheme)
    }

    pub fn project(mut self, v: &str) -> Self {
        self.task.project = Some(v.to_string());
        self
    }

    pub fn target(mut self, v: &str) -> Self {
        self.task.target = Some(v.to_string());
        self
    }

    pub fn workspace(mut self, v: &str) -> Self {
        self.task.workspace = Some(v.to_string());
        self
    }

    pub fn scheme(mut self, v: &str) -> Self {
        self.task.scheme = Some(v.to_string());
        self
    }

    pub fn sdk(mut self, v: &str) -> Self {
        self.task.sdk = Some(v.to_string());
        self
    }

    pub fn configuration(mut self, v: &str) -> Self {
        self.task.configuration = Some(v.to_string());
        self
    }

    pub fn coverage(mut self, v: bool) -> Self {
        self.task.coverage = v;
        self
    }

    pub fn derived_data_path(mut self, v: &str) -> Self {
        self.task.derived_data_path = Some(v.to_string());
        self
    }

    pub fn destination(mut self, v: &str) -> Self {
        self.task.destinations.push(v.to_string());
        self
    }

    pub fn only_testing(mut self, v: &str) -> Self {
        self.task.only_testing.push(v.to_string());
        self
    }

    pub fn skip_testing(mut self, v: &str) -> Self {
        self.task.skip_testing.push(v.to_string());
        self
    }

    pub fn build_setting(mut self, key: &str, value: &str) -> Self {
        self.task
            .build_settings
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn archive_path(mut self, v: &str) -> Self {
        self.task.archive_path = Some(v.to_string());
        self
    }

    pub fn export_path(mut self, v: &str) -> Self {
        self.task.export_path = Some(v.to_string());
        self
    }

    pub fn export_options_plist(mut self, v: &str) -> Self {
        self.task.export_options_plist = Some(v.to_string());
        self
    }

    pub fn formatter(mut self, v: &str) -> Self {
        self.task.formatter = Some(v.to_string());
        self
    }

    pub fn clean_dir(mut self, v: &str) -> Self {
        self.task.clean_dirs.push(v.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
