// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget fan-out of lifecycle events.

use std::sync::Arc;

use smsrelay_core::{Message, SmsRelayError};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::event::{EventKind, LifecycleEvent};
use crate::registry::SubscriberRegistry;

/// Outcome of one [`NotificationBroadcaster::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers present when the event was published.
    pub subscribers: usize,
    /// Subscribers whose queue accepted the event.
    pub delivered: usize,
    /// Subscribers that missed it (queue full or closed).
    pub dropped: usize,
}

/// Pushes every event to every connected subscriber without waiting.
///
/// There is no acknowledgement, retry or replay. A subscriber whose queue is
/// full misses the event; one whose queue is closed is also unregistered.
#[derive(Debug, Clone)]
pub struct NotificationBroadcaster {
    registry: Arc<SubscriberRegistry>,
}

impl NotificationBroadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Hand a snapshot of `message` to each current subscriber.
    ///
    /// Fails only when subscribers were present and none accepted the event.
    pub fn publish(
        &self,
        kind: EventKind,
        message: &Message,
    ) -> Result<PublishReport, SmsRelayError> {
        let subscribers = self.registry.snapshot();
        let mut report = PublishReport {
            subscribers: subscribers.len(),
            ..PublishReport::default()
        };

        if subscribers.is_empty() {
            debug!(event = %kind, message_id = %message.id, "no subscribers, event lost");
            return Ok(report);
        }

        let event = Arc::new(LifecycleEvent::new(kind, message.clone()));
        for (id, handle) in subscribers {
            match handle.tx.try_send(Arc::clone(&event)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    warn!(
                        subscriber_id = %id,
                        label = %handle.label,
                        event = %kind,
                        "subscriber queue full, event dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    report.dropped += 1;
                    self.registry.disconnect(&id);
                    debug!(subscriber_id = %id, event = %kind, "subscriber gone, removed");
                }
            }
        }

        debug!(
            event = %kind,
            event_id = %event.id,
            message_id = %message.id,
            delivered = report.delivered,
            dropped = report.dropped,
            "event published"
        );

        if report.delivered == 0 {
            return Err(SmsRelayError::Broadcast {
                message: format!(
                    "{kind} event for message {} reached none of {} subscribers",
                    message.id, report.subscribers
                ),
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsrelay_core::{
        ChatId, MessageId, MessageStatus, MessageType, ServiceMode, UserMetadata,
    };
    use tracing_test::traced_test;

    fn message(id: &str) -> Message {
        Message {
            id: MessageId::from(id),
            chat_id: ChatId("0123456789abcdef".to_string()),
            phone: "+56911112222".to_string(),
            app: "Shop".to_string(),
            text: "hello".to_string(),
            user: UserMetadata::new().with("name", "Ana"),
            message_type: MessageType::Info,
            status: MessageStatus::Pending,
            mode: ServiceMode::Prod,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn broadcaster(capacity: usize) -> NotificationBroadcaster {
        NotificationBroadcaster::new(Arc::new(SubscriberRegistry::new(capacity)))
    }

    #[test]
    #[traced_test]
    fn no_subscribers_is_not_an_error() {
        let bus = broadcaster(4);
        let report = bus.publish(EventKind::Created, &message("m-1")).unwrap();
        assert_eq!(report, PublishReport::default());
        assert!(logs_contain("no subscribers"));
    }

    #[tokio::test]
    async fn every_subscriber_gets_the_same_event() {
        let bus = broadcaster(4);
        let mut a = bus.registry().connect("a");
        let mut b = bus.registry().connect("b");

        let report = bus.publish(EventKind::Created, &message("m-1")).unwrap();
        assert_eq!(report.subscribers, 2);
        assert_eq!(report.delivered, 2);

        let ea = a.recv().await.unwrap();
        let eb = b.recv().await.unwrap();
        assert_eq!(ea.id, eb.id);
        assert_eq!(ea.event, EventKind::Created);
        assert_eq!(ea.data.id, MessageId::from("m-1"));
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let bus = broadcaster(4);
        let mut sub = bus.registry().connect("agent");

        bus.publish(EventKind::Created, &message("m-1")).unwrap();
        bus.publish(EventKind::StatusChanged, &message("m-1")).unwrap();

        assert_eq!(sub.recv().await.unwrap().event, EventKind::Created);
        assert_eq!(sub.recv().await.unwrap().event, EventKind::StatusChanged);
    }

    #[tokio::test]
    #[traced_test]
    async fn full_queue_drops_for_that_subscriber_only() {
        let bus = broadcaster(1);
        let mut slow = bus.registry().connect("slow");
        let mut fast = bus.registry().connect("fast");

        bus.publish(EventKind::Created, &message("m-1")).unwrap();
        fast.recv().await.unwrap();

        let report = bus.publish(EventKind::Created, &message("m-2")).unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 1);
        assert!(logs_contain("subscriber queue full"));

        assert_eq!(slow.try_recv().unwrap().data.id, MessageId::from("m-1"));
        assert!(slow.try_recv().is_none());
        assert_eq!(fast.try_recv().unwrap().data.id, MessageId::from("m-2"));
    }

    #[test]
    fn all_subscribers_gone_is_a_broadcast_error() {
        let bus = broadcaster(4);
        let sub = bus.registry().connect("gone");
        drop(sub);

        let err = bus.publish(EventKind::Created, &message("m-1")).unwrap_err();
        assert!(matches!(err, SmsRelayError::Broadcast { .. }));
        assert!(bus.registry().is_empty(), "closed subscriber should be removed");
    }
}
