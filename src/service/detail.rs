//! On-demand loading of the selected event's full record.
//!
//! [`EventDetailLoader`] owns the single selected event. A successful fetch
//! replaces the selection wholesale; a failed one leaves it untouched. Each
//! fetch is numbered so that a slow answer for an earlier click cannot
//! overwrite a later one, and clearing the selection invalidates whatever
//! is still in flight. Nothing is cached: selecting the same marker again
//! fetches again.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::api::EventsApi;
use crate::domain::{EventBus, EventDetail, EventId, MapEvent, StaleKind};

/// Observable state of the detail loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailSnapshot {
    /// Selected event, if any.
    pub selected: Option<EventDetail>,
    /// `true` while the latest detail fetch is in flight.
    pub is_loading: bool,
    /// Number of the latest fetch or clear; older answers are ignored.
    pub latest_request: u64,
}

/// Loads full event records and owns the selection.
///
/// Cheap to clone; clones share state.
#[derive(Debug)]
pub struct EventDetailLoader<A> {
    inner: Arc<DetailInner<A>>,
}

impl<A> Clone for EventDetailLoader<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct DetailInner<A> {
    api: Arc<A>,
    bus: EventBus,
    state: watch::Sender<DetailSnapshot>,
}

impl<A: EventsApi> EventDetailLoader<A> {
    /// Creates a loader with nothing selected.
    #[must_use]
    pub fn new(api: Arc<A>, bus: EventBus) -> Self {
        let (state, _) = watch::channel(DetailSnapshot::default());
        Self {
            inner: Arc::new(DetailInner { api, bus, state }),
        }
    }

    /// Fetches the full record of `id` and makes it the selection.
    ///
    /// Returns the new selection, or `None` if the fetch failed or was
    /// superseded by a later [`Self::load_detail`] or [`Self::clear`]; in
    /// both cases the current selection is left as it is. The fetch keeps
    /// running if the returned future is dropped.
    pub async fn load_detail(&self, id: &EventId) -> Option<EventDetail> {
        let mut request = 0;
        self.inner.state.send_modify(|s| {
            s.latest_request += 1;
            request = s.latest_request;
            s.is_loading = true;
        });
        tracing::debug!(request, event_id = %id, "detail fetch dispatched");

        let inner = Arc::clone(&self.inner);
        let id = id.clone();
        let handle = tokio::spawn(async move {
            let result = inner.api.event_detail(&id).await;
            inner.settle(request, &id, result)
        });
        handle.await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "detail task did not complete");
            None
        })
    }

    /// Clears the selection and invalidates any fetch in flight.
    pub fn clear(&self) {
        let mut had_selection = false;
        self.inner.state.send_modify(|s| {
            s.latest_request += 1;
            had_selection = s.selected.take().is_some();
            s.is_loading = false;
        });
        if had_selection {
            tracing::debug!("selection cleared");
            let _ = self.inner.bus.publish(MapEvent::SelectionChanged {
                event_id: None,
                timestamp: Utc::now(),
            });
        }
    }

    /// Returns the selected event.
    #[must_use]
    pub fn selected(&self) -> Option<EventDetail> {
        self.inner.state.borrow().selected.clone()
    }

    /// Returns the id of the selected event.
    #[must_use]
    pub fn selected_id(&self) -> Option<EventId> {
        self.inner
            .state
            .borrow()
            .selected
            .as_ref()
            .map(|d| d.id.clone())
    }

    /// Returns `true` while the latest detail fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    /// Returns a copy of the full state.
    #[must_use]
    pub fn snapshot(&self) -> DetailSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DetailSnapshot> {
        self.inner.state.subscribe()
    }
}

impl<A: EventsApi> DetailInner<A> {
    fn settle(
        &self,
        request: u64,
        id: &EventId,
        result: Result<EventDetail, crate::error::ClientError>,
    ) -> Option<EventDetail> {
        match result {
            Ok(detail) => {
                let mut applied = false;
                self.state.send_if_modified(|s| {
                    if s.latest_request != request {
                        return false;
                    }
                    s.selected = Some(detail.clone());
                    s.is_loading = false;
                    applied = true;
                    true
                });
                if !applied {
                    self.discard(id);
                    return None;
                }
                tracing::info!(event_id = %id, title = %detail.title, "event selected");
                let _ = self.bus.publish(MapEvent::SelectionChanged {
                    event_id: Some(detail.id.clone()),
                    timestamp: Utc::now(),
                });
                Some(detail)
            }
            Err(err) => {
                let latest = self.state.send_if_modified(|s| {
                    if s.latest_request != request {
                        return false;
                    }
                    s.is_loading = false;
                    true
                });
                if !latest {
                    self.discard(id);
                    return None;
                }
                tracing::warn!(
                    event_id = %id,
                    error = %err,
                    "detail fetch failed, keeping selection"
                );
                let _ = self.bus.publish(MapEvent::DetailLoadFailed {
                    event_id: id.clone(),
                    reason: err.to_string(),
                    timestamp: Utc::now(),
                });
                None
            }
        }
    }

    fn discard(&self, id: &EventId) {
        tracing::debug!(event_id = %id, "discarding superseded detail result");
        let _ = self.bus.publish(MapEvent::StaleResultDiscarded {
            kind: StaleKind::Detail,
            request: id.to_string(),
            timestamp: Utc::now(),
        });
    }
}
