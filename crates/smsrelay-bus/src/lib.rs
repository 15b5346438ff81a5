// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push notifications for message lifecycle events.
//!
//! A [`SubscriberRegistry`] tracks connected subscribers, each with its own
//! bounded queue, and a [`NotificationBroadcaster`] fans events out to them.
//! Events are process-local and never replayed.

pub mod broadcaster;
pub mod event;
pub mod registry;

pub use broadcaster::{NotificationBroadcaster, PublishReport};
pub use event::{EventKind, LifecycleEvent};
pub use registry::{DEFAULT_SUBSCRIBER_BUFFER, SubscriberRegistry, Subscription};
