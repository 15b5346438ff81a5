// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Creation and status updates of outbound messages.
//!
//! Every successful write is followed by exactly one broadcast. Persistence
//! and notification are separate steps: a broadcast failure is logged and
//! never changes the result of the write that preceded it.

use std::sync::Arc;

use smsrelay_bus::{EventKind, NotificationBroadcaster};
use smsrelay_core::{
    FieldError, Message, MessageDraft, MessageId, MessageStatus, MessageStore, NewMessage,
    SmsRelayError, derive_chat_id,
};
use tracing::{debug, error, info, warn};

/// Owns the `create` and `update_status` operations.
#[derive(Clone)]
pub struct MessageLifecycle {
    store: Arc<dyn MessageStore>,
    broadcaster: NotificationBroadcaster,
}

impl MessageLifecycle {
    pub fn new(store: Arc<dyn MessageStore>, broadcaster: NotificationBroadcaster) -> Self {
        Self { store, broadcaster }
    }

    /// Store a new message as `PENDING` and announce it with a `created` event.
    pub async fn create(&self, input: NewMessage) -> Result<Message, SmsRelayError> {
        validate_new_message(&input)?;

        let chat_id = derive_chat_id(&input.phone, &input.app);
        let draft = MessageDraft {
            chat_id,
            phone: input.phone,
            app: input.app,
            text: input.text,
            user: input.user,
            message_type: input.message_type,
            status: MessageStatus::Pending,
            mode: input.mode,
        };

        let message = self.store.insert(draft).await.inspect_err(|e| {
            error!(error = %e, "failed to store new message");
        })?;

        info!(
            message_id = %message.id,
            chat_id = %message.chat_id,
            message_type = %message.message_type,
            confirm = message.message_type.requires_confirmation(),
            app = %message.app,
            "message created"
        );
        self.notify(EventKind::Created, &message);
        Ok(message)
    }

    /// Overwrite the status of an existing message and announce it with a
    /// `status-changed` event.
    ///
    /// No transition table is enforced; moving out of a terminal status is
    /// logged but accepted.
    pub async fn update_status(
        &self,
        id: &MessageId,
        status: MessageStatus,
    ) -> Result<Message, SmsRelayError> {
        if id.0.trim().is_empty() {
            return Err(SmsRelayError::invalid("messageId", "must not be blank"));
        }

        let current = self
            .store
            .find_by_id(id)
            .await
            .inspect_err(|e| error!(message_id = %id, error = %e, "failed to load message"))?
            .ok_or_else(|| SmsRelayError::message_not_found(id.0.clone()))?;

        if current.status.is_terminal() && current.status != status {
            info!(
                message_id = %id,
                from = %current.status,
                to = %status,
                "overwriting terminal status"
            );
        }

        let updated = self
            .store
            .update_status(id, status)
            .await
            .inspect_err(|e| error!(message_id = %id, error = %e, "failed to update status"))?
            .ok_or_else(|| SmsRelayError::message_not_found(id.0.clone()))?;

        info!(
            message_id = %updated.id,
            from = %current.status,
            to = %updated.status,
            "message status updated"
        );
        self.notify(EventKind::StatusChanged, &updated);
        Ok(updated)
    }

    fn notify(&self, kind: EventKind, message: &Message) {
        match self.broadcaster.publish(kind, message) {
            Ok(report) => debug!(
                event = %kind,
                message_id = %message.id,
                delivered = report.delivered,
                "notification sent"
            ),
            Err(e) => warn!(
                event = %kind,
                message_id = %message.id,
                error = %e,
                "notification failed after persist"
            ),
        }
    }
}

/// Collect every missing required field of a new message.
fn validate_new_message(input: &NewMessage) -> Result<(), SmsRelayError> {
    let mut fields = Vec::new();
    if input.phone.trim().is_empty() {
        fields.push(FieldError::new("phone", "must not be blank"));
    }
    if input.app.trim().is_empty() {
        fields.push(FieldError::new("app", "must not be blank"));
    }
    if input.text.trim().is_empty() {
        fields.push(FieldError::new("message", "must not be blank"));
    }
    if input.user.is_empty() {
        fields.push(FieldError::new("user", "must not be empty"));
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(SmsRelayError::Validation { fields })
    }
}
