// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Drive operations on the working copy.
//!
//! ```text
//! read_dir("/docs")  --> tokio::fs::read_dir(root/docs), .git hidden
//! remove("/a.txt")   --> delete root/a.txt (recursive for dirs)
//!                        --> pipeline.submit("rm: a.txt", ["a.txt"])
//! listen(id)         --> pipeline.listen(id)
//! ```
//!
//! Paths are drive-relative: a leading `/` is optional, `..` and the `.git`
//! directory are rejected.

pub mod events;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DriveResult, FsError};
use crate::pipeline::{OperationId, PipelineHandle, Subscription};

const METADATA_DIR: &str = ".git";
const BYTES_PER_MB: f64 = 1_048_576.0;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "isDir")]
    pub is_dir: bool,
    /// Size in MiB.
    #[serde(rename = "size")]
    pub size_mb: f64,
}

/// Working copy plus the pipeline that publishes its changes.
#[derive(Debug, Clone)]
pub struct Drive {
    root: PathBuf,
    pipeline: PipelineHandle,
}

impl Drive {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, pipeline: PipelineHandle) -> Self {
        Self {
            root: root.into(),
            pipeline,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists a directory, sorted by name, without the `.git` directory.
    ///
    /// # Errors
    ///
    /// Returns `FsError::NotFound` if the path does not exist,
    /// `FsError::InvalidPath` if it is not a directory or not a drive path, and
    /// `FsError::IoError` if reading fails.
    pub async fn read_dir(&self, path: &str) -> DriveResult<Vec<DirEntry>> {
        let relative = normalize(path)?;
        let target = self.root.join(&relative);

        let metadata = tokio::fs::metadata(&target)
            .await
            .map_err(|e| io_error(path, e))?;
        if !metadata.is_dir() {
            return Err(FsError::InvalidPath {
                path: path.to_string(),
                reason: "not a directory".to_string(),
            }
            .into());
        }

        let mut reader = tokio::fs::read_dir(&target)
            .await
            .map_err(|e| io_error(path, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| io_error(path, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == METADATA_DIR {
                continue;
            }
            let metadata = entry.metadata().await.map_err(|e| io_error(path, e))?;
            #[allow(clippy::cast_precision_loss)]
            let size_mb = metadata.len() as f64 / BYTES_PER_MB;
            entries.push(DirEntry {
                name,
                is_dir: metadata.is_dir(),
                size_mb,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(path = %relative, count = entries.len(), "listed directory");
        Ok(entries)
    }

    /// Deletes a file or directory and submits the deletion for commit.
    ///
    /// Returns as soon as the local deletion is done and the command is
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns `FsError::NotFound` if the path does not exist,
    /// `FsError::InvalidPath` for the root or a non-drive path,
    /// `FsError::IoError` if deletion fails, and
    /// `OperationError::PipelineClosed` if the pipeline has stopped.
    pub async fn remove(&self, path: &str) -> DriveResult<OperationId> {
        let relative = self.delete(path).await?;
        let id = self
            .pipeline
            .submit(commit_message(&relative), vec![relative])
            .await?;
        Ok(id)
    }

    /// [`remove`](Self::remove), also returning a subscription that sees
    /// every snapshot of the operation.
    ///
    /// # Errors
    ///
    /// Same as [`remove`](Self::remove).
    pub async fn remove_and_listen(&self, path: &str) -> DriveResult<(OperationId, Subscription)> {
        let relative = self.delete(path).await?;
        let watched = self
            .pipeline
            .submit_and_listen(commit_message(&relative), vec![relative])
            .await?;
        Ok(watched)
    }

    /// Subscribes to a live operation.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` if the operation is unknown or
    /// already finished.
    pub async fn listen(&self, id: OperationId) -> DriveResult<Subscription> {
        Ok(self.pipeline.listen(id).await?)
    }

    /// Deletes the local copy of `path`, returning its normalized form.
    async fn delete(&self, path: &str) -> DriveResult<String> {
        let relative = normalize(path)?;
        if relative.is_empty() {
            return Err(FsError::InvalidPath {
                path: path.to_string(),
                reason: "cannot remove the drive root".to_string(),
            }
            .into());
        }

        let target = self.root.join(&relative);
        let metadata = tokio::fs::symlink_metadata(&target)
            .await
            .map_err(|e| io_error(path, e))?;
        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&target).await
        } else {
            tokio::fs::remove_file(&target).await
        };
        removed.map_err(|e| io_error(path, e))?;

        info!(path = %relative, dir = metadata.is_dir(), "removed");
        Ok(relative)
    }
}

fn commit_message(relative: &str) -> String {
    format!("rm: {relative}")
}

fn io_error(path: &str, source: std::io::Error) -> FsError {
    if source.kind() == std::io::ErrorKind::NotFound {
        FsError::NotFound(path.to_string())
    } else {
        FsError::IoError {
            path: path.to_string(),
            source,
        }
    }
}

/// Converts a drive path into a `/`-separated path relative to the working
/// copy. The root is the empty string.
///
/// # Errors
///
/// Returns `FsError::InvalidPath` for `..` components or any `.git`
/// component.
pub fn normalize(path: &str) -> Result<String, FsError> {
    let invalid = |reason: &str| FsError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = Vec::new();
    for part in path.trim().split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return Err(invalid("parent directory references are not allowed")),
            METADATA_DIR => return Err(invalid("the git metadata directory is not part of the drive")),
            p => parts.push(p),
        }
    }
    Ok(parts.join("/"))
}
