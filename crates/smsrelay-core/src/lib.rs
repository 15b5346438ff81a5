// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for smsrelay.
//!
//! Holds the message data model, the shared error type, conversation
//! identification, and the adapter traits the storage and gateway crates
//! implement.

pub mod chat;
pub mod error;
pub mod traits;
pub mod types;

pub use chat::derive_chat_id;
pub use error::{FieldError, SmsRelayError};
pub use traits::{MessageStore, PluginAdapter};
pub use types::{
    AdapterType, ChatId, HealthStatus, Message, MessageDraft, MessageFilter, MessageId,
    MessageStatus, MessageType, NewMessage, Page, PageRequest, ServiceMode, SortOrder,
    UserMetadata,
};
