//! Bounded local notification buffer
//!
//! Ordered most-recent-first, capped at a fixed capacity with oldest-first
//! eviction. Mutated by "append on receive" and "remove on acknowledge or
//! clear"; the UI reads snapshots.

use mira_common::events::NotificationPayload;
use std::collections::VecDeque;
use uuid::Uuid;

/// A received notification with its client-local id for acknowledgment
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedNotification {
    pub id: Uuid,
    pub payload: NotificationPayload,
}

/// Fixed-capacity, most-recent-first notification store
#[derive(Debug)]
pub struct NotificationBuffer {
    entries: VecDeque<BufferedNotification>,
    capacity: usize,
}

impl NotificationBuffer {
    /// Create an empty buffer; capacity must be at least 1
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Append a received payload, evicting the oldest entry beyond capacity
    pub fn push(&mut self, payload: NotificationPayload) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.push_front(BufferedNotification { id, payload });
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
        id
    }

    /// Remove one acknowledged notification; no-op for unknown ids
    pub fn acknowledge(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Most-recent-first view for rendering
    pub fn snapshot(&self) -> Vec<BufferedNotification> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
