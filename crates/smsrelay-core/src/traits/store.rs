// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contract for messages.

use async_trait::async_trait;

use crate::error::SmsRelayError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Message, MessageDraft, MessageFilter, MessageId, MessageStatus, SortOrder};

/// Document store holding [`Message`] records.
///
/// The store owns ids and timestamps. Absence is reported with `Option`,
/// never with an error; every `Err` means the store itself failed.
#[async_trait]
pub trait MessageStore: PluginAdapter {
    /// Prepares the backend (open connections, run migrations).
    async fn initialize(&self) -> Result<(), SmsRelayError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), SmsRelayError>;

    /// Persists a draft, assigning `id`, `createdAt` and `updatedAt`.
    async fn insert(&self, draft: MessageDraft) -> Result<Message, SmsRelayError>;

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, SmsRelayError>;

    /// Overwrites `status` and refreshes `updatedAt`. `None` if no such id.
    async fn update_status(
        &self,
        id: &MessageId,
        status: MessageStatus,
    ) -> Result<Option<Message>, SmsRelayError>;

    async fn find_many(
        &self,
        filter: &MessageFilter,
        sort: SortOrder,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<Message>, SmsRelayError>;

    async fn count(&self, filter: &MessageFilter) -> Result<u64, SmsRelayError>;
}
