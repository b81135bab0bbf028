// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Read-only working copy queries using gix.
//!
//! ```text
//! query.rs --> gix::open --> .git/ (no subprocess)
//! ```

use std::path::Path;

use crate::error::GixError;

/// Whether `path` is the root of a non-bare git working copy.
#[must_use]
pub fn is_work_tree(path: &Path) -> bool {
    gix::open(path).is_ok_and(|repo| repo.workdir().is_some())
}

/// Current branch name of the working copy (None if HEAD is detached).
///
/// # Errors
///
/// Returns a `GixError` if the repository cannot be opened, is bare, or HEAD
/// cannot be resolved.
pub fn current_branch(path: &Path) -> Result<Option<String>, GixError> {
    let repo = gix::open(path).map_err(|e| GixError::Open(Box::new(e)))?;
    if repo.workdir().is_none() {
        return Err(GixError::BareRepository);
    }
    let head = repo.head_name()?;
    Ok(head.map(|name| name.shorten().to_string()))
}
