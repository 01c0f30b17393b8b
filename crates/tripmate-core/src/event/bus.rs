//! Broadcast event bus for distributing `SessionEvent` to multiple subscribers.
//!
//! Built on `tokio::sync::broadcast`, the `EventBus` supports multiple
//! concurrent subscribers. Publishing with no active subscribers is a no-op.
//! A subscriber receives every event published after it subscribed, in
//! publish order.

use tokio::sync::broadcast;
use tracing::trace;

use tripmate_types::event::SessionEvent;

/// Default channel capacity. Session events are rare; this only has to
/// absorb bursts such as a refresh storm settling.
pub const DEFAULT_CAPACITY: usize = 64;

/// Multi-consumer bus for session events. Clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no subscribers, the event is silently dropped.
    pub fn publish(&self, event: SessionEvent) {
        trace!(?event, receivers = self.sender.receiver_count(), "publishing session event");
        let _ = self.sender.send(event);
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripmate_types::event::LoginReason;

    fn auth_changed(authenticated: bool) -> SessionEvent {
        SessionEvent::AuthChanged { authenticated }
    }

    #[tokio::test]
    async fn publish_and_subscribe_delivers_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(auth_changed(true));

        let received = rx.recv().await.unwrap();
        assert_eq!(received, auth_changed(true));
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(auth_changed(true));
        bus.publish(SessionEvent::LoginRequired {
            reason: LoginReason::RefreshRejected,
        });
        bus.publish(auth_changed(false));

        assert_eq!(rx.recv().await.unwrap(), auth_changed(true));
        assert!(matches!(
            rx.recv().await.unwrap(),
            SessionEvent::LoginRequired { .. }
        ));
        assert_eq!(rx.recv().await.unwrap(), auth_changed(false));
    }

    #[tokio::test]
    async fn subscriber_does_not_see_events_published_before_it_subscribed() {
        let bus = EventBus::new(16);
        let _keepalive = bus.subscribe();
        bus.publish(auth_changed(true));

        let mut late = bus.subscribe();
        bus.publish(auth_changed(false));

        assert_eq!(late.recv().await.unwrap(), auth_changed(false));
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.publish(auth_changed(true));
        bus.publish(auth_changed(false));
    }

    #[test]
    fn clone_shares_channel() {
        let bus = EventBus::new(16);
        let bus2 = bus.clone();
        let mut rx = bus.subscribe();

        bus2.publish(auth_changed(true));

        assert!(rx.try_recv().is_ok());
        assert_eq!(bus.receiver_count(), 1);
    }

    #[test]
    fn debug_shows_subscriber_count() {
        let bus = EventBus::default();
        let _rx = bus.subscribe();
        assert_eq!(format!("{bus:?}"), "EventBus { subscribers: 1 }");
    }
}
