// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Asynchronous mutation pipeline.
//!
//! ```text
//!  callers (any task)                       "drive-dispatcher" thread
//!  ,-----------------,   mpsc (bounded)    ,--------------------------,
//!  | PipelineHandle  | ------------------> | Dispatcher               |
//!  |  submit()       |  Submit / Listen    |  Backend                 |
//!  |  listen()       | <------------------ |  OperationRegistry       |
//!  '-----------------'  oneshot reply      |  BoundedQueue<Command>   |
//!          ^                               '------------+-------------'
//!          |        broadcast per operation             |
//!          '-------------- Subscription <---------------'
//! ```
//!
//! `submit` returns as soon as the command is accepted; staging, committing
//! and pushing happen on the dispatcher. A `listen` sent after a `submit` on
//! the same handle is processed after it, so the operation is found unless it
//! already reached a terminal state. `submit_and_listen` subscribes before any
//! git work and therefore also sees immediate stage or commit failures.

mod dispatcher;
mod operation;
mod registry;

#[cfg(test)]
pub(crate) mod test_utils;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use bon::Builder;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use dispatcher::EVICTED;
pub use operation::{Command, IdGenerator, Operation, OperationId, Stage, Status};
pub use registry::{OperationRegistry, SUBSCRIBER_BUFFER, Subscription};

use crate::config::types::PipelineConfig;
use crate::error::{DriveResult, OperationError, ProcessError};
use crate::git::Backend;
use crate::queue::BoundedQueue;
use dispatcher::{Dispatcher, Message};

pub const DEFAULT_QUEUE_CAPACITY: usize = 20;
pub const DEFAULT_COMMAND_BUFFER: usize = 20;
pub const DEFAULT_PUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_PULL_INTERVAL: Duration = Duration::from_secs(1);

const WORKER_NAME: &str = "drive-dispatcher";

/// Timing and sizing of a pipeline.
#[derive(Debug, Clone, Builder)]
pub struct PipelineOptions {
    /// Period of the batched push.
    #[builder(default = DEFAULT_PUSH_INTERVAL)]
    pub push_interval: Duration,
    /// Quiet time after which the dispatcher pulls.
    #[builder(default = DEFAULT_PULL_INTERVAL)]
    pub pull_interval: Duration,
    /// Committed commands held for the next push before the oldest is evicted.
    #[builder(default = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
    /// Inbound channel size.
    #[builder(default = DEFAULT_COMMAND_BUFFER)]
    pub command_buffer: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self::builder()
            .push_interval(Duration::from_millis(config.push_interval_ms))
            .pull_interval(Duration::from_millis(config.pull_interval_ms))
            .queue_capacity(config.queue_capacity)
            .command_buffer(config.command_buffer)
            .build()
    }
}

/// Cloneable async entry point to a running pipeline.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    sender: mpsc::Sender<Message>,
    ids: Arc<IdGenerator>,
}

impl PipelineHandle {
    /// Enqueues a mutation and returns its id without waiting for git.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::PipelineClosed`] if the dispatcher has exited.
    pub async fn submit(
        &self,
        message: impl Into<String>,
        paths: Vec<String>,
    ) -> Result<OperationId, OperationError> {
        let command = self.command(message.into(), paths);
        let id = command.id;
        self.send(Message::Submit {
            command,
            watch: None,
        })
        .await?;
        Ok(id)
    }

    /// Like [`submit`](Self::submit), but subscribes before any git work so
    /// even an immediate stage or commit failure is observed.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::PipelineClosed`] if the dispatcher has exited.
    pub async fn submit_and_listen(
        &self,
        message: impl Into<String>,
        paths: Vec<String>,
    ) -> Result<(OperationId, Subscription), OperationError> {
        let command = self.command(message.into(), paths);
        let id = command.id;
        let (watch, subscription) = oneshot::channel();
        self.send(Message::Submit {
            command,
            watch: Some(watch),
        })
        .await?;
        let subscription = subscription
            .await
            .map_err(|_| OperationError::PipelineClosed)?;
        Ok((id, subscription))
    }

    fn command(&self, message: String, paths: Vec<String>) -> Command {
        Command {
            id: self.ids.next_id(),
            message,
            paths,
        }
    }

    async fn send(&self, message: Message) -> Result<(), OperationError> {
        if let Message::Submit { command, .. } = &message {
            debug!(id = %command.id, paths = ?command.paths, "submitting command");
        }
        self.sender
            .send(message)
            .await
            .map_err(|_| OperationError::PipelineClosed)
    }

    /// Subscribes to the snapshots of a live operation.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] if the id is unknown or already
    /// terminal, [`OperationError::PipelineClosed`] if the dispatcher has
    /// exited.
    pub async fn listen(&self, id: OperationId) -> Result<Subscription, OperationError> {
        let (reply, response) = oneshot::channel();
        self.send(Message::Listen { id, reply }).await?;
        response.await.map_err(|_| OperationError::PipelineClosed)?
    }

    /// Whether the dispatcher is still accepting messages.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Owner of the dispatcher thread.
///
/// Dropping a `Pipeline` cancels the dispatcher without waiting for it;
/// [`Pipeline::shutdown`] also waits for the final push.
#[derive(Debug)]
pub struct Pipeline {
    handle: PipelineHandle,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Opens (or clones) the working copy and starts the dispatcher thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the working copy cannot be opened or cloned, the
    /// queue capacity is zero, or the worker cannot be started.
    pub fn start<B: Backend>(mut backend: B, options: &PipelineOptions) -> DriveResult<Self> {
        backend.open_or_clone()?;

        let queue = BoundedQueue::new(options.queue_capacity)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (sender, rx) = mpsc::channel(options.command_buffer.max(1));
        let cancel = CancellationToken::new();

        let dispatcher = Dispatcher::new(
            backend,
            queue,
            options.push_interval,
            options.pull_interval,
        );
        let token = cancel.clone();
        let worker = std::thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || dispatcher.run(runtime, rx, token))
            .map_err(|source| ProcessError::SpawnFailed {
                command: WORKER_NAME.to_string(),
                source,
            })?;

        info!(
            capacity = options.queue_capacity,
            push_interval_ms = options.push_interval.as_millis(),
            "pipeline started"
        );
        Ok(Self {
            handle: PipelineHandle {
                sender,
                ids: Arc::new(IdGenerator::new()),
            },
            cancel,
            worker: Some(worker),
        })
    }

    /// A new handle for submitting and listening.
    #[must_use]
    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    /// Stops the dispatcher. Commands already accepted by a handle are still
    /// staged and committed, then everything queued goes out in a final push.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Worker`] if the dispatcher thread panicked.
    pub async fn shutdown(mut self) -> DriveResult<()> {
        self.cancel.cancel();
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let joined = tokio::task::spawn_blocking(move || worker.join())
            .await
            .map_err(|e| ProcessError::Worker {
                message: e.to_string(),
            })?;
        joined.map_err(|_| ProcessError::Worker {
            message: "dispatcher thread panicked".to_string(),
        })?;
        info!("pipeline stopped");
        Ok(())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
