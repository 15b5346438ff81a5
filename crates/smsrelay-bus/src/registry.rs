// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local registry of connected subscribers.
//!
//! Each subscriber owns a bounded queue. The registry holds the sending half;
//! the [`Subscription`] handed back by [`SubscriberRegistry::connect`] holds
//! the receiving half.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::event::LifecycleEvent;

/// Default per-subscriber queue capacity.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub(crate) struct SubscriberHandle {
    pub(crate) label: String,
    pub(crate) tx: mpsc::Sender<Arc<LifecycleEvent>>,
}

/// Concurrent map of subscriber id to queue.
#[derive(Debug)]
pub struct SubscriberRegistry {
    subscribers: DashMap<String, SubscriberHandle>,
    capacity: usize,
}

impl SubscriberRegistry {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber. `label` is only used in logs.
    pub fn connect(&self, label: impl Into<String>) -> Subscription {
        let id = uuid::Uuid::new_v4().to_string();
        let label = label.into();
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.insert(
            id.clone(),
            SubscriberHandle {
                label: label.clone(),
                tx,
            },
        );
        debug!(subscriber_id = %id, label = %label, total = self.len(), "subscriber connected");
        Subscription { id, label, rx }
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn disconnect(&self, id: &str) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        if removed {
            debug!(subscriber_id = %id, total = self.len(), "subscriber disconnected");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the current subscribers; publishing iterates this, not the map.
    pub(crate) fn snapshot(&self) -> Vec<(String, SubscriberHandle)> {
        self.subscribers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

/// Receiving side of one subscriber's queue.
#[derive(Debug)]
pub struct Subscription {
    id: String,
    label: String,
    rx: mpsc::Receiver<Arc<LifecycleEvent>>,
}

impl Subscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wait for the next event. `None` once the subscriber was disconnected
    /// and the queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<LifecycleEvent>> {
        self.rx.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<LifecycleEvent>> {
        self.rx.try_recv().ok()
    }
}
