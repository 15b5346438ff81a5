// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message store for deterministic testing.
//!
//! `MemoryMessageStore` implements `MessageStore` over a `Vec` kept in
//! insertion order, with switches to simulate backend failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio::sync::Mutex;

use smsrelay_core::{
    AdapterType, HealthStatus, Message, MessageDraft, MessageFilter, MessageId, MessageStatus,
    MessageStore, PluginAdapter, SmsRelayError, SortOrder,
};

/// A `MessageStore` held entirely in memory.
///
/// - `fail_next_insert()` makes the next `insert` fail with a storage error.
/// - `set_unavailable(true)` makes every operation fail until reset.
/// - `drop_on_update(true)` simulates a record deleted between lookup and write.
/// - `fail_health_check(true)` makes `health_check` return an error.
pub struct MemoryMessageStore {
    records: Mutex<Vec<Message>>,
    fail_next_insert: AtomicBool,
    unavailable: AtomicBool,
    vanish_on_update: AtomicBool,
    health_error: AtomicBool,
    insert_calls: AtomicUsize,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_next_insert: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
            vanish_on_update: AtomicBool::new(false),
            health_error: AtomicBool::new(false),
            insert_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `insert` call only.
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    /// Fail every call while `true`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Report every id as absent at write time while `true`.
    pub fn drop_on_update(&self, vanish: bool) {
        self.vanish_on_update.store(vanish, Ordering::SeqCst);
    }

    /// Make `health_check` fail outright while `true`.
    pub fn fail_health_check(&self, fail: bool) {
        self.health_error.store(fail, Ordering::SeqCst);
    }

    /// Number of `insert` calls, successful or not.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored record in insertion order.
    pub async fn records(&self) -> Vec<Message> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    fn check_available(&self) -> Result<(), SmsRelayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(unavailable_error());
        }
        Ok(())
    }
}

impl Default for MemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable_error() -> SmsRelayError {
    SmsRelayError::Storage {
        source: "memory store unavailable".into(),
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl PluginAdapter for MemoryMessageStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SmsRelayError> {
        if self.health_error.load(Ordering::SeqCst) {
            return Err(SmsRelayError::Storage {
                source: "injected health check failure".into(),
            });
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("memory store unavailable".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SmsRelayError> {
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn initialize(&self) -> Result<(), SmsRelayError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), SmsRelayError> {
        Ok(())
    }

    async fn insert(&self, draft: MessageDraft) -> Result<Message, SmsRelayError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(SmsRelayError::Storage {
                source: "injected insert failure".into(),
            });
        }

        let timestamp = now();
        let message = Message {
            id: MessageId(uuid::Uuid::new_v4().to_string()),
            chat_id: draft.chat_id,
            phone: draft.phone,
            app: draft.app,
            text: draft.text,
            user: draft.user,
            message_type: draft.message_type,
            status: draft.status,
            mode: draft.mode,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };
        self.records.lock().await.push(message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, SmsRelayError> {
        self.check_available()?;
        let records = self.records.lock().await;
        Ok(records.iter().find(|m| &m.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: &MessageId,
        status: MessageStatus,
    ) -> Result<Option<Message>, SmsRelayError> {
        self.check_available()?;
        if self.vanish_on_update.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let mut records = self.records.lock().await;
        Ok(records.iter_mut().find(|m| &m.id == id).map(|m| {
            m.status = status;
            m.updated_at = now();
            m.clone()
        }))
    }

    async fn find_many(
        &self,
        filter: &MessageFilter,
        sort: SortOrder,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<Message>, SmsRelayError> {
        self.check_available()?;
        let records = self.records.lock().await;
        let matching: Vec<&Message> = records.iter().filter(|m| filter.matches(m)).collect();
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let page = match sort {
            SortOrder::NewestFirst => matching
                .into_iter()
                .rev()
                .skip(skip)
                .take(limit)
                .cloned()
                .collect(),
            SortOrder::OldestFirst => matching
                .into_iter()
                .skip(skip)
                .take(limit)
                .cloned()
                .collect(),
        };
        Ok(page)
    }

    async fn count(&self, filter: &MessageFilter) -> Result<u64, SmsRelayError> {
        self.check_available()?;
        let records = self.records.lock().await;
        Ok(records.iter().filter(|m| filter.matches(m)).count() as u64)
    }
}
