// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!               DriveError (~24 bytes)
//!                      |
//!   +------+------+----+----+------+------+------+
//!   |      |      |         |      |      |      |
//!   v      v      v         v      v      v      v
//!  Git   Config  Fs    Operation Queue Process   Io
//!  Box    Box    Box      Box     Box    Box     Box
//!
//! Sub-errors (unboxed internally):
//!   Git       Open, Clone, Pull, Stage, Commit, Push, Gix
//!   Config    ParseError, MissingKey, InvalidValue
//!   Fs        NotFound, InvalidPath, IoError
//!   Operation NotFound, PipelineClosed
//!   Queue     Empty
//!   Process   ExecutableNotFound, SpawnFailed, Worker
//! ```

use thiserror::Error;

use crate::pipeline::OperationId;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`DriveError`].
pub type DriveResult<T> = std::result::Result<T, DriveError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Git backend operation failed.
    #[error("git error: {0}")]
    Git(#[from] Box<GitError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Filesystem error.
    #[error("filesystem error: {0}")]
    Fs(#[from] Box<FsError>),

    /// Operation tracking error.
    #[error("operation error: {0}")]
    Operation(#[from] Box<OperationError>),

    /// Push queue error.
    #[error("queue error: {0}")]
    Queue(#[from] Box<QueueError>),

    /// Process or worker thread error.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),
}

impl DriveError {
    /// Returns the operation error if this is one.
    #[must_use]
    pub fn as_operation(&self) -> Option<&OperationError> {
        match self {
            Self::Operation(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the filesystem error if this is one.
    #[must_use]
    pub fn as_fs(&self) -> Option<&FsError> {
        match self {
            Self::Fs(err) => Some(err),
            _ => None,
        }
    }
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for DriveError {
                fn from(err: $error) -> Self {
                    DriveError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    GitError => Git,
    ConfigError => Config,
    FsError => Fs,
    OperationError => Operation,
    QueueError => Queue,
    ProcessError => Process,
    std::io::Error => Io,
}

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to open repository.
    #[error("failed to open repository: {0}")]
    Open(#[from] Box<gix::open::Error>),

    /// Failed to get HEAD reference.
    #[error("failed to get head reference: {0}")]
    Head(#[from] gix::reference::find::existing::Error),

    /// Repository has no worktree (bare repository).
    #[error("repository has no worktree (bare repository)")]
    BareRepository,
}

// --- Git Errors ---

/// Backend failures, one variant per backend capability.
///
/// Every variant carries the raw reason reported by git; [`GitError::reason`]
/// returns it verbatim so operations can record it as their failure data.
#[derive(Debug, Error)]
pub enum GitError {
    /// Opening the existing working copy failed.
    #[error("failed to open working copy {path}: {message}")]
    OpenFailed { path: String, message: String },

    /// Clone operation failed.
    #[error("failed to clone {url}: {message}")]
    CloneFailed { url: String, message: String },

    /// Pull failed for a reason other than being up to date.
    #[error("pull failed: {message}")]
    PullFailed { message: String },

    /// Staging a path failed.
    #[error("failed to stage {path}: {message}")]
    StageFailed { path: String, message: String },

    /// Commit failed.
    #[error("commit failed: {message}")]
    CommitFailed { message: String },

    /// Push failed for a reason other than having nothing to push.
    #[error("push failed: {message}")]
    PushFailed { message: String },

    /// Raw git command failure.
    #[error("git command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),
}

impl GitError {
    /// The reason reported by the backend, without the capability prefix.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::OpenFailed { message, .. }
            | Self::CloneFailed { message, .. }
            | Self::PullFailed { message }
            | Self::StageFailed { message, .. }
            | Self::CommitFailed { message }
            | Self::PushFailed { message }
            | Self::CommandFailed { message, .. } => message.clone(),
            Self::Gix(err) => err.to_string(),
        }
    }
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration sources.
    #[error("failed to parse config '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Filesystem Errors ---

/// Filesystem operation errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path not found.
    #[error("path not found: {0}")]
    NotFound(String),

    /// Path escapes the working copy or targets protected metadata.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// General I/O error.
    #[error("I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// --- Operation Errors ---

/// Operation tracking errors.
#[derive(Debug, Error)]
pub enum OperationError {
    /// No live operation with this id.
    #[error("operation {0} not found")]
    NotFound(OperationId),

    /// An operation with this id is already registered.
    #[error("operation {0} already exists")]
    Duplicate(OperationId),

    /// The dispatcher has stopped and no longer accepts messages.
    #[error("pipeline is closed")]
    PipelineClosed,
}

// --- Queue Errors ---

/// Bounded queue errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// Dequeue on an empty queue.
    #[error("queue is empty")]
    Empty,

    /// Construction with zero capacity.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,
}

// --- Process Errors ---

/// Process and worker thread errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Executable not found in PATH.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Dispatcher worker could not be started or panicked.
    #[error("dispatcher worker failed: {message}")]
    Worker { message: String },
}
