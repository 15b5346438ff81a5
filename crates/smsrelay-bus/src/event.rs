// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle event types pushed to subscribers.
//!
//! Wire frame (one JSON text frame per event):
//! ```json
//! {"id": "…", "event": "created", "emittedAt": "2026-01-01T00:00:00.000Z", "data": {…}}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use smsrelay_core::Message;
use strum::{AsRefStr, Display, EnumString};

/// Which lifecycle transition produced an event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum EventKind {
    /// A message was stored with status `PENDING`.
    #[serde(rename = "created")]
    #[strum(serialize = "created")]
    Created,
    /// A message status was overwritten.
    #[serde(rename = "status-changed")]
    #[strum(serialize = "status-changed")]
    StatusChanged,
}

/// An event carrying a full snapshot of the affected message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    /// Unique per emission, so subscribers can de-duplicate.
    pub id: String,
    pub event: EventKind,
    #[serde(with = "millis")]
    pub emitted_at: DateTime<Utc>,
    pub data: Message,
}

impl LifecycleEvent {
    pub fn new(event: EventKind, data: Message) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            emitted_at: Utc::now(),
            data,
        }
    }

    /// Serialize to the JSON text frame sent over the WebSocket.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// RFC 3339 with millisecond precision, matching the store's timestamps.
mod millis {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
