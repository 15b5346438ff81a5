// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ready-made inputs and subscriber helpers.

use std::sync::Arc;
use std::time::Duration;

use smsrelay_bus::{LifecycleEvent, Subscription};
use smsrelay_core::{
    MessageDraft, MessageStatus, MessageType, NewMessage, ServiceMode, UserMetadata,
    derive_chat_id,
};

/// A valid CODE message for `phone` and `app`.
pub fn new_message(phone: &str, app: &str) -> NewMessage {
    NewMessage {
        phone: phone.to_string(),
        app: app.to_string(),
        text: "Your verification code is 4821".to_string(),
        user: sample_user(),
        message_type: MessageType::Code,
        mode: ServiceMode::Test,
    }
}

/// A pending draft, as the lifecycle would hand it to a store.
pub fn draft(phone: &str, app: &str) -> MessageDraft {
    let msg = new_message(phone, app);
    MessageDraft {
        chat_id: derive_chat_id(&msg.phone, &msg.app),
        phone: msg.phone,
        app: msg.app,
        text: msg.text,
        user: msg.user,
        message_type: msg.message_type,
        status: MessageStatus::Pending,
        mode: msg.mode,
    }
}

pub fn sample_user() -> UserMetadata {
    UserMetadata::new()
        .with("id", 42i64)
        .with("name", "Ana")
        .with("verified", true)
}

/// Wait up to `timeout` for the next event on `subscription`.
pub async fn next_event(
    subscription: &mut Subscription,
    timeout: Duration,
) -> Option<Arc<LifecycleEvent>> {
    tokio::time::timeout(timeout, subscription.recv())
        .await
        .ok()
        .flatten()
}

/// Every event currently queued, without waiting.
pub fn drain(subscription: &mut Subscription) -> Vec<Arc<LifecycleEvent>> {
    std::iter::from_fn(|| subscription.try_recv()).collect()
}
