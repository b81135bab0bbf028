// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fixed-capacity ring buffer used to batch committed commands for a push.
//!
//! ```text
//!  capacity = 5, enqueue 1..=8
//!
//!   slots:  [6] [7] [8] [4] [5]
//!                    ^   ^
//!                 tail  head
//!
//!   drain() --> 4, 5, 6, 7, 8   (1, 2, 3 were evicted)
//! ```
//!
//! No internal synchronization: the queue has a single owner.

use crate::error::QueueError;

/// FIFO ring buffer that overwrites its oldest entry when full.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        Ok(Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            head: 0,
            tail: 0,
            len: 0,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Appends an item; never blocks and never fails.
    ///
    /// When the queue is full the oldest item is overwritten and returned so
    /// the caller can account for it.
    pub fn enqueue(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.head = self.advance(self.head);
            self.slots[self.tail].take()
        } else {
            self.len += 1;
            None
        };
        self.slots[self.tail] = Some(item);
        self.tail = self.advance(self.tail);
        evicted
    }

    /// Removes and returns the oldest item.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Empty`] if there is nothing to dequeue.
    pub fn dequeue(&mut self) -> Result<T, QueueError> {
        if self.is_empty() {
            return Err(QueueError::Empty);
        }
        let item = self.slots[self.head].take().ok_or(QueueError::Empty)?;
        self.head = self.advance(self.head);
        self.len -= 1;
        Ok(item)
    }

    /// Lazily drains the queue in FIFO order.
    ///
    /// Destructive: every item yielded is gone from the queue. Items not
    /// consumed before the iterator is dropped stay queued.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain { queue: self }
    }

    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }
}

/// Iterator returned by [`BoundedQueue::drain`].
#[derive(Debug)]
pub struct Drain<'a, T> {
    queue: &'a mut BoundedQueue<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.dequeue().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.len(), Some(self.queue.len()))
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}
