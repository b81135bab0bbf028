// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Table of live operations and their subscriber channels.
//!
//! ```text
//! insert(id)      --> entry { snapshot, history, sender }   publish queued
//! advance(id, s)  --> snapshot.stage = s                    publish
//! succeed/fail    --> terminal snapshot                     publish, remove
//!                     (sender dropped => subscribers see closure)
//! subscribe(id)   --> Subscription { backlog = history, live = rx }
//! ```
//!
//! Owned by the dispatcher thread only. Subscribers receive a replay of every
//! snapshot published before they subscribed, then live updates.

use std::collections::{HashMap, VecDeque};

use futures_util::Stream;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use super::operation::{Operation, OperationId, Stage};
use crate::error::OperationError;

/// Buffer per subscriber channel: every transition of one operation fits.
pub const SUBSCRIBER_BUFFER: usize = 8;

struct Entry {
    snapshot: Operation,
    history: Vec<Operation>,
    sender: broadcast::Sender<Operation>,
}

impl Entry {
    fn publish(&mut self) {
        self.history.push(self.snapshot.clone());
        // no receivers is fine: nobody is listening yet
        let _ = self.sender.send(self.snapshot.clone());
    }
}

/// Live operations keyed by id.
#[derive(Default)]
pub struct OperationRegistry {
    entries: HashMap<OperationId, Entry>,
}

impl OperationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a new operation and publishes its `queued` snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Duplicate`] if `id` is already live.
    pub fn insert(&mut self, id: OperationId) -> Result<(), OperationError> {
        if self.entries.contains_key(&id) {
            return Err(OperationError::Duplicate(id));
        }
        let (sender, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        let mut entry = Entry {
            snapshot: Operation::new(id),
            history: Vec::with_capacity(SUBSCRIBER_BUFFER),
            sender,
        };
        entry.snapshot.advance(Stage::Queued);
        entry.publish();
        self.entries.insert(id, entry);
        trace!(%id, "operation registered");
        Ok(())
    }

    /// Advances a live operation to `stage` and publishes it.
    ///
    /// Returns `false` if the id is unknown or the transition is not forward.
    pub fn advance(&mut self, id: OperationId, stage: Stage) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            warn!(%id, %stage, "advance on unknown operation");
            return false;
        };
        if !entry.snapshot.advance(stage) {
            warn!(%id, %stage, current = %entry.snapshot.stage, "ignored backward stage transition");
            return false;
        }
        entry.publish();
        true
    }

    /// Terminates an operation as successful, then removes it.
    pub fn succeed(&mut self, id: OperationId) -> bool {
        self.finish(id, Operation::succeed)
    }

    /// Terminates an operation as failed with `reason`, then removes it.
    pub fn fail(&mut self, id: OperationId, reason: &str) -> bool {
        self.finish(id, |op| op.fail(reason))
    }

    fn finish(&mut self, id: OperationId, terminate: impl FnOnce(&mut Operation) -> bool) -> bool {
        let Some(mut entry) = self.entries.remove(&id) else {
            warn!(%id, "terminal update on unknown operation");
            return false;
        };
        if !terminate(&mut entry.snapshot) {
            return false;
        }
        entry.publish();
        debug!(
            %id,
            status = %entry.snapshot.status,
            subscribers = entry.sender.receiver_count(),
            "operation finished"
        );
        // entry (and its sender) dropped here: channel closes after the
        // terminal snapshot has been delivered
        true
    }

    /// Subscribes to a live operation.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::NotFound`] if no live operation has this id.
    pub fn subscribe(&self, id: OperationId) -> Result<Subscription, OperationError> {
        let entry = self
            .entries
            .get(&id)
            .ok_or(OperationError::NotFound(id))?;
        Ok(Subscription {
            id,
            backlog: entry.history.iter().cloned().collect(),
            live: entry.sender.subscribe(),
        })
    }
}

/// Ordered stream of snapshots for one operation, ending after the terminal
/// snapshot.
///
/// Dropping a subscription only detaches this observer.
pub struct Subscription {
    id: OperationId,
    backlog: VecDeque<Operation>,
    live: broadcast::Receiver<Operation>,
}

impl Subscription {
    #[must_use]
    pub const fn id(&self) -> OperationId {
        self.id
    }

    /// Next snapshot, or `None` once the channel has closed.
    pub async fn next(&mut self) -> Option<Operation> {
        if let Some(op) = self.backlog.pop_front() {
            return Some(op);
        }
        loop {
            match self.live.recv().await {
                Ok(op) => return Some(op),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(id = %self.id, skipped, "subscriber lagged, intermediate updates dropped");
                }
            }
        }
    }

    /// Collects snapshots until the channel closes.
    pub async fn collect(mut self) -> Vec<Operation> {
        let mut snapshots = Vec::new();
        while let Some(op) = self.next().await {
            snapshots.push(op);
        }
        snapshots
    }

    /// Converts into a [`Stream`] of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = Operation> + Send {
        futures_util::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|op| (op, sub))
        })
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("backlog", &self.backlog.len())
            .finish_non_exhaustive()
    }
}
