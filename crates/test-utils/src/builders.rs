#![allow(dead_code)]

use sitepipe::config::{ConfigFile, RawConfigFile, TaskConfig};
use sitepipe::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Replace the dependency list of `task`.
    pub fn with_after(mut self, task: &str, after: &[&str]) -> Self {
        self.config.task.insert(
            task.to_string(),
            TaskConfig {
                after: Some(after.iter().map(|s| s.to_string()).collect()),
            },
        );
        self
    }

    pub fn with_behaviour(mut self, behaviour: &str) -> Self {
        self.config.config.triggered_while_running_behaviour = behaviour.to_string();
        self
    }

    pub fn with_queue_length(mut self, len: usize) -> Self {
        self.config.config.queue_length = len;
        self
    }

    /// Replace the external JS commands, e.g. with `cat`-based stand-ins.
    pub fn with_js_commands(mut self, bundle_cmd: &str, minify_cmd: &str) -> Self {
        self.config.js.bundle_cmd = bundle_cmd.to_string();
        self.config.js.minify_cmd = minify_cmd.to_string();
        self
    }

    pub fn with_otf2ttf_cmd(mut self, cmd: &str) -> Self {
        self.config.fonts.otf2ttf_cmd = cmd.to_string();
        self
    }

    pub fn with_webp_quality(mut self, quality: u8) -> Self {
        self.config.images.webp_quality = quality;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
