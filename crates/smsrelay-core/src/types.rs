// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the store, lifecycle, bus and gateway crates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::SmsRelayError;

/// Store-assigned identifier of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Conversation grouping key derived from `(phone, app)`. See [`crate::chat`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of an outbound message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum MessageType {
    /// One-time code; the delivery agent must confirm the send.
    #[serde(rename = "CODE", alias = "Codigo")]
    #[strum(to_string = "CODE", serialize = "Codigo")]
    Code,
    /// Informational message; confirmation is optional.
    #[serde(rename = "INFO", alias = "Informativo")]
    #[strum(to_string = "INFO", serialize = "Informativo")]
    Info,
}

impl MessageType {
    /// Whether the delivery agent is expected to report the outcome.
    pub fn requires_confirmation(self) -> bool {
        matches!(self, Self::Code)
    }
}

/// Delivery lifecycle state of a message.
///
/// `Pending` is the only initial state. `Sent` and `Failed` are intended to be
/// terminal, but nothing enforces it: any status may overwrite any other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum MessageStatus {
    #[serde(rename = "PENDING", alias = "Pendiente")]
    #[strum(to_string = "PENDING", serialize = "Pendiente")]
    Pending,
    #[serde(rename = "SENT", alias = "Enviado")]
    #[strum(to_string = "SENT", serialize = "Enviado")]
    Sent,
    #[serde(rename = "FAILED", alias = "Fallido")]
    #[strum(to_string = "FAILED", serialize = "Fallido")]
    Failed,
}

impl MessageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

/// Environment the requesting application runs in.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceMode {
    #[default]
    Prod,
    Dev,
    Test,
    Stage,
}

/// A primitive value inside [`UserMetadata`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Opaque metadata describing the actor who requested the send.
///
/// Keys are free-form; values are restricted to primitives so the record
/// stays queryable without untyped access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserMetadata(BTreeMap<String, MetadataValue>);

impl UserMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    /// Returns the value for `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(MetadataValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.0.iter()
    }
}

/// A stored outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub phone: String,
    pub app: String,
    #[serde(rename = "message")]
    pub text: String,
    pub user: UserMetadata,
    pub message_type: MessageType,
    pub status: MessageStatus,
    #[serde(default)]
    pub mode: ServiceMode,
    /// RFC 3339 UTC, millisecond precision, set by the store.
    pub created_at: String,
    /// RFC 3339 UTC, millisecond precision, refreshed by the store on every update.
    pub updated_at: String,
}

/// Caller-supplied fields for a new message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub phone: String,
    pub app: String,
    pub text: String,
    pub user: UserMetadata,
    pub message_type: MessageType,
    pub mode: ServiceMode,
}

/// The document handed to [`crate::MessageStore::insert`]; everything but
/// the id and timestamps, which the store assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub chat_id: ChatId,
    pub phone: String,
    pub app: String,
    pub text: String,
    pub user: UserMetadata,
    pub message_type: MessageType,
    pub status: MessageStatus,
    pub mode: ServiceMode,
}

/// Criteria for listing messages. `None` fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Exact match.
    pub message_type: Option<MessageType>,
    /// Exact match.
    pub status: Option<MessageStatus>,
    /// Case-insensitive substring match.
    pub phone: Option<String>,
    /// Case-insensitive substring match.
    pub app: Option<String>,
    /// Exact match.
    pub chat_id: Option<ChatId>,
}

impl MessageFilter {
    pub fn by_chat(chat_id: ChatId) -> Self {
        Self {
            chat_id: Some(chat_id),
            ..Self::default()
        }
    }

    /// Whether `msg` satisfies every present criterion.
    ///
    /// Used by in-memory stores; SQL stores express the same rules in the query.
    pub fn matches(&self, msg: &Message) -> bool {
        fn contains_ci(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        self.message_type.is_none_or(|t| msg.message_type == t)
            && self.status.is_none_or(|s| msg.status == s)
            && self.phone.as_deref().is_none_or(|p| contains_ci(&msg.phone, p))
            && self.app.as_deref().is_none_or(|a| contains_ci(&msg.app, a))
            && self.chat_id.as_ref().is_none_or(|c| &msg.chat_id == c)
    }
}

/// Ordering by creation time. Ties are broken by insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Fails with a validation error when `page` or `limit` is zero.
    pub fn new(page: u32, limit: u32) -> Result<Self, SmsRelayError> {
        let mut fields = Vec::new();
        if page < 1 {
            fields.push(crate::error::FieldError::new(
                "page",
                "must be greater than or equal to 1",
            ));
        }
        if limit < 1 {
            fields.push(crate::error::FieldError::new(
                "limit",
                "must be greater than or equal to 1",
            ));
        }
        if !fields.is_empty() {
            return Err(SmsRelayError::Validation { fields });
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records to skip: `(page - 1) * limit`.
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus the total number of matching records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum AdapterType {
    Storage,
    Gateway,
}
