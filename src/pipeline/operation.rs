// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Operation snapshots and identifiers.
//!
//! ```text
//! Stage:   pending --> queued --> add --> commit --> push
//! progress    0          0       33       66        69
//!
//! Status:  pending --> success (100) | failed
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Identifier of a tracked mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(i64);

impl OperationId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OperationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Allocates time-derived ids that stay unique within the same millisecond.
///
/// Each id is `max(now_ms, previous + 1)`.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    pub fn next_id(&self) -> OperationId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX));

        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return OperationId(next),
                Err(actual) => last = actual,
            }
        }
    }
}

/// Position of an operation in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Pending,
    Queued,
    Add,
    Commit,
    Push,
}

impl Stage {
    /// Progress percentage reported when entering this stage.
    #[must_use]
    pub const fn progress(self) -> u32 {
        match self {
            Self::Pending | Self::Queued => 0,
            Self::Add => 33,
            Self::Commit => 66,
            Self::Push => 69,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Add => "add",
            Self::Commit => "commit",
            Self::Push => "push",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome classification; `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Success,
    Failed,
}

impl Status {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Snapshot of a tracked mutation, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub stage: Stage,
    pub progress: u32,
    pub status: Status,
    pub data: String,
}

impl Operation {
    #[must_use]
    pub const fn new(id: OperationId) -> Self {
        Self {
            id,
            stage: Stage::Pending,
            progress: 0,
            status: Status::Pending,
            data: String::new(),
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves to `stage`. Returns `false` (and changes nothing) if the
    /// operation is terminal or `stage` would go backwards.
    pub const fn advance(&mut self, stage: Stage) -> bool {
        if self.is_terminal() || (stage as u8) < (self.stage as u8) {
            return false;
        }
        self.stage = stage;
        self.progress = stage.progress();
        true
    }

    /// Marks the operation successful. Returns `false` if already terminal.
    pub fn succeed(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = Status::Success;
        self.progress = 100;
        true
    }

    /// Marks the operation failed with `reason`. Returns `false` if already
    /// terminal.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = Status::Failed;
        self.data = reason.into();
        true
    }
}

/// Immutable unit of work handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: OperationId,
    pub message: String,
    pub paths: Vec<String>,
}
