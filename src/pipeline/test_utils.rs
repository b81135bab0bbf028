// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recording backend for dispatcher tests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::GitError;
use crate::git::{Backend, BackendResult};

use super::{Operation, PipelineOptions, Subscription};

#[derive(Debug, Default)]
pub(crate) struct State {
    pub opens: usize,
    pub pulls: usize,
    pub pushes: usize,
    pub staged: Vec<String>,
    pub commits: Vec<String>,
    /// Time each `pull` blocks the dispatcher for.
    pub pull_delay: Option<Duration>,
    pub open_error: Option<String>,
    pub pull_error: Option<String>,
    pub stage_error: Option<String>,
    pub commit_error: Option<String>,
    pub push_error: Option<String>,
}

/// Backend whose calls are recorded in shared state; failures are injected
/// by setting the matching `*_error` message.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("mock state poisoned")
    }
}

impl Backend for MockBackend {
    fn open_or_clone(&mut self) -> BackendResult<()> {
        let mut state = self.state();
        state.opens += 1;
        match &state.open_error {
            Some(message) => Err(GitError::OpenFailed {
                path: "mock".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn pull(&mut self) -> BackendResult<()> {
        let delay = self.state().pull_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let mut state = self.state();
        state.pulls += 1;
        match &state.pull_error {
            Some(message) => Err(GitError::PullFailed {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn stage(&mut self, paths: &[String]) -> BackendResult<()> {
        let mut state = self.state();
        if let Some(message) = state.stage_error.clone() {
            return Err(GitError::StageFailed {
                path: paths.first().cloned().unwrap_or_default(),
                message,
            });
        }
        state.staged.extend_from_slice(paths);
        Ok(())
    }

    fn commit(&mut self, message: &str) -> BackendResult<()> {
        let mut state = self.state();
        if let Some(error) = state.commit_error.clone() {
            return Err(GitError::CommitFailed { message: error });
        }
        state.commits.push(message.to_string());
        Ok(())
    }

    fn push(&mut self) -> BackendResult<()> {
        let mut state = self.state();
        state.pushes += 1;
        match &state.push_error {
            Some(message) => Err(GitError::PushFailed {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Short intervals so a flush happens well within a test timeout.
pub(crate) fn fast_options() -> PipelineOptions {
    PipelineOptions::builder()
        .push_interval(Duration::from_millis(150))
        .pull_interval(Duration::from_millis(40))
        .build()
}

/// Collects a subscription, failing the test if it never closes.
pub(crate) async fn collect(subscription: Subscription) -> Vec<Operation> {
    tokio::time::timeout(Duration::from_secs(10), subscription.collect())
        .await
        .expect("subscription did not close in time")
}
