//! Notifications emitted by the core components.
//!
//! Every observable state change publishes a [`MapEvent`] through the
//! [`super::EventBus`]. A presentation layer subscribes to re-render; tests
//! subscribe to wait for a specific transition instead of sleeping.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{EventId, GeoPoint, PeriodFilter, ViewportBounds};

/// Where the initial map center came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterSource {
    /// The device location service produced a position.
    Device,
    /// The location service failed; the configured fallback was used.
    Fallback,
}

/// Which operation a discarded result belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleKind {
    /// A bounds query superseded by a later dispatch.
    Sync,
    /// A detail fetch superseded by a later selection.
    Detail,
    /// A review list for an event that is no longer selected.
    ReviewList,
    /// A review submission for an event that is no longer selected.
    ReviewSubmit,
}

/// Domain notification published after every state transition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MapEvent {
    /// The initial viewport center is known.
    InitialCenterResolved {
        /// Resolved center.
        center: GeoPoint,
        /// Device position or fallback.
        source: CenterSource,
        /// Resolution time.
        timestamp: DateTime<Utc>,
    },

    /// A bounds query left the client.
    SyncDispatched {
        /// Generation tag of the query.
        generation: u64,
        /// Queried rectangle.
        bounds: ViewportBounds,
        /// Queried period.
        period: PeriodFilter,
        /// Dispatch time.
        timestamp: DateTime<Utc>,
    },

    /// The visible event set was replaced by a query result.
    EventsReplaced {
        /// Generation tag of the applied result.
        generation: u64,
        /// Number of markers now visible.
        count: usize,
        /// Application time.
        timestamp: DateTime<Utc>,
    },

    /// The latest bounds query failed; the previous markers stay.
    SyncFailed {
        /// Generation tag of the failed query.
        generation: u64,
        /// Failure description.
        reason: String,
        /// Failure time.
        timestamp: DateTime<Utc>,
    },

    /// A result arrived for a superseded request and was dropped.
    StaleResultDiscarded {
        /// Which operation the result belonged to.
        kind: StaleKind,
        /// Human-readable tag of the stale request (generation or event id).
        request: String,
        /// Discard time.
        timestamp: DateTime<Utc>,
    },

    /// The selected event changed.
    SelectionChanged {
        /// New selection, `None` when cleared.
        event_id: Option<EventId>,
        /// Change time.
        timestamp: DateTime<Utc>,
    },

    /// A detail fetch failed; the selection was left as it was.
    DetailLoadFailed {
        /// Requested event.
        event_id: EventId,
        /// Failure description.
        reason: String,
        /// Failure time.
        timestamp: DateTime<Utc>,
    },

    /// The review list for the selected event was replaced.
    ReviewsLoaded {
        /// Selected event.
        event_id: EventId,
        /// Number of reviews now held.
        count: usize,
        /// Load time.
        timestamp: DateTime<Utc>,
    },

    /// Listing reviews for the selected event failed.
    ReviewsFailed {
        /// Selected event.
        event_id: EventId,
        /// Failure description.
        reason: String,
        /// Failure time.
        timestamp: DateTime<Utc>,
    },

    /// A review was accepted by the server.
    ReviewSubmitted {
        /// Reviewed event.
        event_id: EventId,
        /// Submission time.
        timestamp: DateTime<Utc>,
    },

    /// A review was refused, locally or by the server.
    ReviewRejected {
        /// Reviewed event, if one was selected.
        event_id: Option<EventId>,
        /// Failure description.
        reason: String,
        /// `true` when no request was sent.
        local: bool,
        /// Rejection time.
        timestamp: DateTime<Utc>,
    },
}

impl MapEvent {
    /// Returns the event this notification concerns, if any.
    #[must_use]
    pub fn event_id(&self) -> Option<&EventId> {
        match self {
            Self::DetailLoadFailed { event_id, .. }
            | Self::ReviewsLoaded { event_id, .. }
            | Self::ReviewsFailed { event_id, .. }
            | Self::ReviewSubmitted { event_id, .. } => Some(event_id),
            Self::SelectionChanged { event_id, .. } | Self::ReviewRejected { event_id, .. } => {
                event_id.as_ref()
            }
            Self::InitialCenterResolved { .. }
            | Self::SyncDispatched { .. }
            | Self::EventsReplaced { .. }
            | Self::SyncFailed { .. }
            | Self::StaleResultDiscarded { .. } => None,
        }
    }

    /// Returns the notification time.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::InitialCenterResolved { timestamp, .. }
            | Self::SyncDispatched { timestamp, .. }
            | Self::EventsReplaced { timestamp, .. }
            | Self::SyncFailed { timestamp, .. }
            | Self::StaleResultDiscarded { timestamp, .. }
            | Self::SelectionChanged { timestamp, .. }
            | Self::DetailLoadFailed { timestamp, .. }
            | Self::ReviewsLoaded { timestamp, .. }
            | Self::ReviewsFailed { timestamp, .. }
            | Self::ReviewSubmitted { timestamp, .. }
            | Self::ReviewRejected { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_type_tag() {
        let event = MapEvent::EventsReplaced {
            generation: 4,
            count: 12,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(
            json.get("event_type").and_then(|v| v.as_str()),
            Some("events_replaced")
        );
        assert_eq!(json.get("generation").and_then(|v| v.as_u64()), Some(4));
    }

    #[test]
    fn event_id_is_exposed_for_review_events() {
        let id = EventId::from(3);
        let event = MapEvent::ReviewsLoaded {
            event_id: id.clone(),
            count: 0,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_id(), Some(&id));

        let cleared = MapEvent::SelectionChanged {
            event_id: None,
            timestamp: Utc::now(),
        };
        assert_eq!(cleared.event_id(), None);
    }
}
