//! Fan-out of [`MapEvent`] notifications.
//!
//! Components publish after they change observable state. Their state lives
//! in `watch` snapshots, so a subscriber that lags only misses transitions,
//! never the current state; [`next_matching`] skips over the gap.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::MapEvent;

/// Broadcast bus shared by every component of one session.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MapEvent>,
}

impl EventBus {
    /// Creates a bus keeping up to `capacity` undelivered notifications.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notification, returning how many subscribers got it.
    ///
    /// Without subscribers the notification is dropped.
    pub fn publish(&self, event: MapEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "notification without subscribers");
                0
            }
        }
    }

    /// Subscribes to every notification published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.sender.subscribe()
    }
}

/// Waits for the next notification accepted by `pred`.
///
/// Notifications lost to lag are skipped. Returns `None` once every
/// [`EventBus`] handle is gone.
pub async fn next_matching<F>(
    rx: &mut broadcast::Receiver<MapEvent>,
    mut pred: F,
) -> Option<MapEvent>
where
    F: FnMut(&MapEvent) -> bool,
{
    loop {
        match rx.recv().await {
            Ok(event) if pred(&event) => return Some(event),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "notification subscriber lagged");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::EventId;

    fn selection(id: i64) -> MapEvent {
        MapEvent::SelectionChanged {
            event_id: Some(EventId::from(id)),
            timestamp: Utc::now(),
        }
    }

    fn cleared() -> MapEvent {
        MapEvent::SelectionChanged {
            event_id: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn unobserved_notifications_are_dropped() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(selection(1)), 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_notification() {
        let bus = EventBus::new(16);
        let mut map_view = bus.subscribe();
        let mut sidebar = bus.subscribe();

        assert_eq!(bus.publish(selection(2)), 2);

        let Ok(a) = map_view.recv().await else {
            panic!("map view missed the notification");
        };
        let Ok(b) = sidebar.recv().await else {
            panic!("sidebar missed the notification");
        };
        assert_eq!(a.event_id(), Some(&EventId::from(2)));
        assert_eq!(a.event_id(), b.event_id());
    }

    #[tokio::test]
    async fn next_matching_skips_unrelated_notifications() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(cleared());
        bus.publish(selection(5));

        let found = next_matching(&mut rx, |e| e.event_id().is_some()).await;

        assert_eq!(found.and_then(|e| e.event_id().cloned()), Some(EventId::from(5)));
    }

    #[tokio::test]
    async fn next_matching_survives_lag() {
        let bus = EventBus::new(0);
        let mut rx = bus.subscribe();
        bus.publish(selection(1));
        bus.publish(selection(2));
        bus.publish(selection(3));

        let found = next_matching(&mut rx, |_| true).await;

        assert_eq!(found.and_then(|e| e.event_id().cloned()), Some(EventId::from(3)));
    }

    #[tokio::test]
    async fn next_matching_ends_when_the_bus_is_gone() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        drop(bus);

        assert!(next_matching(&mut rx, |_| true).await.is_none());
    }
}
