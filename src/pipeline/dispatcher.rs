// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The single worker that owns the backend, the registry and the push queue.
//!
//! ```text
//!                    select! (biased)
//!   cancel.cancelled() ---------------> close rx, handle what is left,
//!                                        flush, exit
//!   rx.recv()  Submit{cmd, watch} ----> insert -> stage -> add
//!                                        -> commit -> commit -> enqueue
//!              Listen{id, reply} -----> registry.subscribe(id)
//!              closed ----------------> flush, exit
//!   push_timer.tick() ----------------> drain -> push (69) -> push()
//!                                        -> success (100) | failed
//!   sleep(pull_interval) -------------> pull() (errors logged only)
//! ```

use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, trace, warn};

use super::operation::{Command, OperationId, Stage};
use super::registry::{OperationRegistry, Subscription};
use crate::error::OperationError;
use crate::git::{Backend, tolerate};
use crate::queue::BoundedQueue;

/// Failure reason recorded for a command pushed out of a full queue.
pub const EVICTED: &str = "evicted from push queue before push";

/// Requests accepted by the dispatcher.
pub(crate) enum Message {
    /// `watch` receives a subscription taken before any backend work.
    Submit {
        command: Command,
        watch: Option<oneshot::Sender<Subscription>>,
    },
    Listen {
        id: OperationId,
        reply: oneshot::Sender<Result<Subscription, OperationError>>,
    },
}

pub(crate) struct Dispatcher<B: Backend> {
    backend: B,
    registry: OperationRegistry,
    queue: BoundedQueue<Command>,
    push_interval: Duration,
    pull_interval: Duration,
}

impl<B: Backend> Dispatcher<B> {
    pub(crate) fn new(
        backend: B,
        queue: BoundedQueue<Command>,
        push_interval: Duration,
        pull_interval: Duration,
    ) -> Self {
        Self {
            backend,
            registry: OperationRegistry::new(),
            queue,
            push_interval,
            pull_interval,
        }
    }

    /// Drives the loop on `runtime` until cancelled or every sender is gone.
    pub(crate) fn run(
        mut self,
        runtime: Runtime,
        rx: mpsc::Receiver<Message>,
        cancel: CancellationToken,
    ) {
        let _span = info_span!("dispatcher").entered();
        info!(
            push_interval_ms = self.push_interval.as_millis(),
            pull_interval_ms = self.pull_interval.as_millis(),
            capacity = self.queue.capacity(),
            "dispatcher started"
        );
        runtime.block_on(self.event_loop(rx, cancel));
        info!("dispatcher stopped");
    }

    async fn event_loop(&mut self, mut rx: mpsc::Receiver<Message>, cancel: CancellationToken) {
        let mut push_timer =
            tokio::time::interval_at(Instant::now() + self.push_interval, self.push_interval);
        push_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!("shutdown requested");
                    // accepted commands already have an id; finish them
                    rx.close();
                    let mut pending = 0_usize;
                    while let Some(message) = rx.recv().await {
                        pending += 1;
                        self.handle(message);
                    }
                    if pending > 0 {
                        debug!(pending, "processed commands accepted before shutdown");
                    }
                    self.flush();
                    break;
                }

                message = rx.recv() => match message {
                    Some(message) => self.handle(message),
                    None => {
                        debug!("all handles dropped");
                        self.flush();
                        break;
                    }
                },

                _ = push_timer.tick() => self.flush(),

                () = tokio::time::sleep(self.pull_interval) => self.pull(),
            }
        }
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Submit { command, watch } => self.submit(command, watch),
            Message::Listen { id, reply } => {
                // receiver gone means the caller stopped waiting
                let _ = reply.send(self.registry.subscribe(id));
            }
        }
    }

    /// Stages and commits one command, then queues it for the next push.
    fn submit(&mut self, command: Command, watch: Option<oneshot::Sender<Subscription>>) {
        let id = command.id;
        if let Err(e) = self.registry.insert(id) {
            warn!(%id, error = %e, "dropping command");
            return;
        }
        if let Some(watch) = watch
            && let Ok(subscription) = self.registry.subscribe(id)
        {
            let _ = watch.send(subscription);
        }
        trace!(%id, paths = ?command.paths, "processing command");

        if let Err(e) = self.backend.stage(&command.paths) {
            warn!(%id, error = %e, "stage failed");
            self.registry.fail(id, &e.reason());
            return;
        }
        self.registry.advance(id, Stage::Add);

        if let Err(e) = self.backend.commit(&command.message) {
            warn!(%id, error = %e, "commit failed");
            self.registry.fail(id, &e.reason());
            return;
        }
        self.registry.advance(id, Stage::Commit);

        if let Some(evicted) = self.queue.enqueue(command) {
            warn!(id = %evicted.id, "push queue full, evicting oldest command");
            self.registry.fail(evicted.id, EVICTED);
        }
        debug!(
            %id,
            queued = self.queue.len(),
            live = self.registry.len(),
            "command committed"
        );
    }

    /// Pushes every queued command with a single backend push.
    fn flush(&mut self) {
        if self.queue.is_empty() {
            trace!("nothing queued, skipping push");
            return;
        }

        let ids: Vec<OperationId> = self.queue.drain().map(|command| command.id).collect();
        for &id in &ids {
            self.registry.advance(id, Stage::Push);
        }

        match tolerate(self.backend.push()) {
            Ok(()) => {
                for &id in &ids {
                    self.registry.succeed(id);
                }
                info!(count = ids.len(), "pushed");
            }
            Err(e) => {
                let reason = e.reason();
                for &id in &ids {
                    self.registry.fail(id, &reason);
                }
                error!(count = ids.len(), error = %e, "push failed");
            }
        }
    }

    fn pull(&mut self) {
        match tolerate(self.backend.pull()) {
            Ok(()) => trace!("pulled"),
            Err(e) => warn!(error = %e, "idle pull failed"),
        }
    }
}
