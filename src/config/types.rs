// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for drive-rs.
//!
//! # Config Structure
//!
//! ```text
//! Config: GlobalConfig, RepoConfig, PipelineConfig
//! RepoConfig.url | (owner, name, transport) --> remote_url()
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::logging::{LogFormat, LogLevel};
use crate::git::shell::DEFAULT_NETWORK_TIMEOUT;
use crate::pipeline::{
    DEFAULT_COMMAND_BUFFER, DEFAULT_PULL_INTERVAL, DEFAULT_PUSH_INTERVAL, DEFAULT_QUEUE_CAPACITY,
};

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for console output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file; no file logging when unset.
    pub log_file: Option<PathBuf>,
    /// Console output format.
    pub log_format: LogFormat,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
            log_format: LogFormat::Pretty,
        }
    }
}

/// Protocol used for derived GitHub URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Ssh,
    Https,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ssh => write!(f, "ssh"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// Working copy and remote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Local working copy location.
    pub path: PathBuf,
    /// Explicit remote URL; takes precedence over owner/name.
    pub url: Option<String>,
    /// GitHub owner used to derive the URL.
    pub owner: Option<String>,
    /// GitHub repository name used to derive the URL.
    pub name: Option<String>,
    pub transport: Transport,
    /// Remote name.
    pub remote: String,
    /// Branch to clone, pull and push; the remote's default when unset.
    pub branch: Option<String>,
    /// Commit identity; git's own configuration when unset.
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    /// Seconds before a clone, pull or push is killed.
    pub network_timeout_secs: u64,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("drive"),
            url: None,
            owner: None,
            name: None,
            transport: Transport::Ssh,
            remote: "origin".to_string(),
            branch: None,
            author_name: None,
            author_email: None,
            network_timeout_secs: DEFAULT_NETWORK_TIMEOUT.as_secs(),
        }
    }
}

impl RepoConfig {
    /// Remote URL: `url` if set, otherwise derived from owner/name.
    ///
    /// ```text
    /// ssh    git@github.com:{owner}/{name}.git
    /// https  https://github.com/{owner}/{name}
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if neither `url` nor both `owner` and
    /// `name` are set.
    pub fn remote_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }

        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        let owner = non_empty(&self.owner).ok_or_else(|| missing_repo_key("owner"))?;
        let name = non_empty(&self.name).ok_or_else(|| missing_repo_key("name"))?;

        Ok(match self.transport {
            Transport::Ssh => format!("git@github.com:{owner}/{name}.git"),
            Transport::Https => format!("https://github.com/{owner}/{name}"),
        })
    }
}

fn missing_repo_key(key: &str) -> ConfigError {
    ConfigError::MissingKey {
        section: "repo".to_string(),
        key: key.to_string(),
    }
}

/// Dispatcher timing and sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Committed commands held for one push.
    pub queue_capacity: usize,
    /// Inbound command channel size.
    pub command_buffer: usize,
    pub push_interval_ms: u64,
    pub pull_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            command_buffer: DEFAULT_COMMAND_BUFFER,
            push_interval_ms: duration_ms(DEFAULT_PUSH_INTERVAL),
            pull_interval_ms: duration_ms(DEFAULT_PULL_INTERVAL),
        }
    }
}

impl PipelineConfig {
    /// Rejects zero sizes and intervals.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first zero key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("queue_capacity", self.queue_capacity == 0),
            ("command_buffer", self.command_buffer == 0),
            ("push_interval_ms", self.push_interval_ms == 0),
            ("pull_interval_ms", self.pull_interval_ms == 0),
        ];
        match checks.into_iter().find(|(_, zero)| *zero) {
            Some((key, _)) => Err(ConfigError::InvalidValue {
                section: "pipeline".to_string(),
                key: key.to_string(),
                message: "must be greater than zero".to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
