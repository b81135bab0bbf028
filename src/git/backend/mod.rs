// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git backend abstraction layer.
//!
//! ```text
//! Backend (trait, sync, single caller)
//!   open_or_clone  pull  stage  commit  push
//!         |
//!         v
//!   ShellBackend (git CLI)   -- production
//!   test backends            -- record calls, inject failures
//! ```
//!
//! Pull and push treat "already up to date" / "nothing to push" as success.
//! [`tolerate`] applies that rule to any backend's result.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::GitError;

/// Result type for backend calls.
pub type BackendResult<T> = std::result::Result<T, GitError>;

/// Repository capability owned by the pipeline's dispatcher.
///
/// Methods are synchronous and are never invoked concurrently.
pub trait Backend: Send + 'static {
    /// Open the working copy, cloning it first if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `OpenFailed` or `CloneFailed`; the pipeline cannot start.
    fn open_or_clone(&mut self) -> BackendResult<()>;

    /// Bring the working copy up to date with the remote.
    ///
    /// # Errors
    ///
    /// Returns `PullFailed` unless the remote had nothing new.
    fn pull(&mut self) -> BackendResult<()>;

    /// Stage `paths` (relative to the working copy) for the next commit.
    ///
    /// # Errors
    ///
    /// Returns `StageFailed` naming the first path that could not be staged.
    fn stage(&mut self, paths: &[String]) -> BackendResult<()>;

    /// Commit the staged changes.
    ///
    /// # Errors
    ///
    /// Returns `CommitFailed`.
    fn commit(&mut self, message: &str) -> BackendResult<()>;

    /// Push local commits to the remote.
    ///
    /// # Errors
    ///
    /// Returns `PushFailed` unless there was nothing to push.
    fn push(&mut self) -> BackendResult<()>;
}

fn up_to_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(already up[- ]to[- ]date|everything up[- ]to[- ]date|nothing to push)\.?$")
            .unwrap_or_else(|e| unreachable!("static pattern is valid: {e}"))
    })
}

/// Whether `reason` is one of the benign "nothing to do" messages.
#[must_use]
pub fn is_up_to_date(reason: &str) -> bool {
    up_to_date_pattern().is_match(&reason.trim().to_lowercase())
}

/// Maps a tolerated pull/push failure to success.
///
/// Only `PullFailed` and `PushFailed` are ever tolerated.
///
/// # Errors
///
/// Returns the original error if it is not a tolerated condition.
pub fn tolerate(result: BackendResult<()>) -> BackendResult<()> {
    match result {
        Err(GitError::PullFailed { message } | GitError::PushFailed { message })
            if is_up_to_date(&message) =>
        {
            Ok(())
        }
        other => other,
    }
}
