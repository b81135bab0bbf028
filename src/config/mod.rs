// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for drive-rs.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. --config FILE (repeatable)
//! 3. drive.toml (cwd, optional)
//! 4. DRIVE_* env vars
//! 5. --set key=value and CLI flags
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! DRIVE_REPO__PATH=/srv/drive          → repo.path
//! DRIVE_REPO__AUTHOR_NAME=Drive        → repo.author_name
//! DRIVE_PIPELINE__PUSH_INTERVAL_MS=500 → pipeline.push_interval_ms
//! ```
//!
//! # Example
//!
//! ```toml
//! [repo]
//! path = "/srv/drive"
//! owner = "acme"
//! name = "files"
//! transport = "https"
//!
//! [pipeline]
//! push_interval_ms = 2000
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{DriveResult, Result};

use loader::ConfigLoader;
use types::{GlobalConfig, PipelineConfig, RepoConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Working copy and remote.
    pub repo: RepoConfig,
    /// Dispatcher timing.
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use drive_rs::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file("drive.toml")
    ///     .with_env_prefix("DRIVE")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Check values that deserialization alone cannot.
    ///
    /// The remote URL is only required by commands that start the pipeline,
    /// so it is not checked here.
    ///
    /// # Errors
    ///
    /// Returns an error for zero pipeline sizes or intervals, a zero network
    /// timeout, or an empty working copy path.
    pub fn validate(&self) -> DriveResult<()> {
        if self.repo.path.as_os_str().is_empty() {
            return Err(crate::error::ConfigError::MissingKey {
                section: "repo".to_string(),
                key: "path".to_string(),
            }
            .into());
        }
        if self.repo.network_timeout_secs == 0 {
            return Err(crate::error::ConfigError::InvalidValue {
                section: "repo".to_string(),
                key: "network_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            }
            .into());
        }
        self.pipeline.validate()?;
        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// Output is sorted by key and aligned on `=`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_repo_options(&mut options);
        self.format_pipeline_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global
                .log_file
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
        options.insert(
            "global.log_format".into(),
            self.global.log_format.to_string(),
        );
    }

    fn format_repo_options(&self, options: &mut BTreeMap<String, String>) {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();

        options.insert("repo.path".into(), self.repo.path.display().to_string());
        options.insert(
            "repo.url".into(),
            self.repo.remote_url().unwrap_or_default(),
        );
        options.insert("repo.transport".into(), self.repo.transport.to_string());
        options.insert("repo.remote".into(), self.repo.remote.clone());
        options.insert("repo.branch".into(), opt(&self.repo.branch));
        options.insert("repo.author_name".into(), opt(&self.repo.author_name));
        options.insert("repo.author_email".into(), opt(&self.repo.author_email));
        options.insert(
            "repo.network_timeout_secs".into(),
            self.repo.network_timeout_secs.to_string(),
        );
    }

    fn format_pipeline_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "pipeline.queue_capacity".into(),
            self.pipeline.queue_capacity.to_string(),
        );
        options.insert(
            "pipeline.command_buffer".into(),
            self.pipeline.command_buffer.to_string(),
        );
        options.insert(
            "pipeline.push_interval_ms".into(),
            self.pipeline.push_interval_ms.to_string(),
        );
        options.insert(
            "pipeline.pull_interval_ms".into(),
            self.pipeline.pull_interval_ms.to_string(),
        );
    }
}
