//! Viewport-driven event synchronization.
//!
//! [`ViewportEventSynchronizer`] keeps the visible marker set equal to the
//! events of the active period inside the current viewport.
//!
//! - Viewport changes are debounced: only the last change of a burst is
//!   queried, once the map has been quiet for the configured period.
//! - A period change is a discrete action and queries immediately with the
//!   current bounds, cancelling any pending debounced query.
//! - Every query gets a generation number at dispatch. A result is applied
//!   only if its generation is still the highest dispatched; anything older
//!   is dropped on arrival (last-dispatched wins, not last-completed).
//! - Failures keep the previous markers.
//!
//! In-flight queries are never aborted; superseded ones simply have their
//! result discarded.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use chrono::Utc;
use tokio::sync::watch;

use super::debounce::Debouncer;
use crate::api::{BoundsQuery, EventsApi};
use crate::config::ClientConfig;
use crate::domain::{
    EventBus, EventId, EventSummary, GeoPoint, IconSpec, MapEvent, PeriodFilter, StaleKind,
    ViewportBounds,
};
use crate::error::ClientError;

/// Observable state of the synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    /// Visible events, replaced wholesale on every applied result.
    pub events: Vec<EventSummary>,
    /// `true` while the latest dispatched query is in flight.
    pub is_loading: bool,
    /// Most recent viewport reported by the map.
    pub bounds: Option<ViewportBounds>,
    /// Active period filter.
    pub period: PeriodFilter,
    /// Highest generation dispatched so far (0 before the first query).
    pub latest_generation: u64,
    /// Generation whose result is displayed (0 before the first result).
    pub applied_generation: u64,
}

impl SyncSnapshot {
    fn initial(period: PeriodFilter) -> Self {
        Self {
            events: Vec::new(),
            is_loading: false,
            bounds: None,
            period,
            latest_generation: 0,
            applied_generation: 0,
        }
    }
}

/// A visible event paired with the icon it is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Event identifier.
    pub id: EventId,
    /// Marker position.
    pub position: GeoPoint,
    /// Icon from the configured catalog.
    pub icon: IconSpec,
}

/// Debounced, generation-gated bounds synchronizer.
///
/// Cheap to clone; clones share state.
#[derive(Debug)]
pub struct ViewportEventSynchronizer<A> {
    inner: Arc<SyncInner<A>>,
}

impl<A> Clone for ViewportEventSynchronizer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct SyncInner<A> {
    api: Arc<A>,
    config: Arc<ClientConfig>,
    bus: EventBus,
    state: watch::Sender<SyncSnapshot>,
    debouncer: Debouncer,
}

impl<A: EventsApi> ViewportEventSynchronizer<A> {
    /// Creates a synchronizer with no markers and the configured default period.
    #[must_use]
    pub fn new(api: Arc<A>, config: Arc<ClientConfig>, bus: EventBus) -> Self {
        let (state, _) = watch::channel(SyncSnapshot::initial(config.default_period));
        let debouncer = Debouncer::new(config.sync_debounce);
        Self {
            inner: Arc::new(SyncInner {
                api,
                config,
                bus,
                state,
                debouncer,
            }),
        }
    }

    /// Reports that the visible bounds or the period filter changed.
    ///
    /// A changed period queries immediately; otherwise the query is
    /// (re)scheduled after the debounce period.
    pub fn on_viewport_settled(&self, bounds: ViewportBounds, period: PeriodFilter) {
        let mut period_changed = false;
        self.inner.state.send_if_modified(|s| {
            period_changed = s.period != period;
            s.bounds = Some(bounds);
            s.period = period;
            false
        });

        if period_changed {
            self.inner.debouncer.cancel();
            tracing::debug!(%period, %bounds, "period changed, querying immediately");
            self.inner.dispatch(bounds, period);
            return;
        }

        let weak: Weak<SyncInner<A>> = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(async move {
            if let Some(inner) = weak.upgrade() {
                inner.dispatch(bounds, period);
            }
        });
    }

    /// Switches the period filter, querying immediately with the current bounds.
    ///
    /// Without known bounds the period is only recorded; the first viewport
    /// report will use it.
    pub fn set_period(&self, period: PeriodFilter) {
        let (current_period, bounds) = {
            let s = self.inner.state.borrow();
            (s.period, s.bounds)
        };
        if current_period == period {
            return;
        }
        match bounds {
            Some(bounds) => self.on_viewport_settled(bounds, period),
            None => {
                self.inner.state.send_if_modified(|s| {
                    s.period = period;
                    false
                });
            }
        }
    }

    /// Re-queries the current viewport immediately.
    ///
    /// Returns the dispatched generation, or `None` when no viewport has
    /// been reported yet.
    pub fn refresh(&self) -> Option<u64> {
        let (bounds, period) = {
            let s = self.inner.state.borrow();
            (s.bounds?, s.period)
        };
        self.inner.debouncer.cancel();
        Some(self.inner.dispatch(bounds, period))
    }

    /// Returns `true` while the latest query is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    /// Returns `true` while a debounced query has not fired yet.
    #[must_use]
    pub fn has_pending_query(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// Returns the visible events.
    #[must_use]
    pub fn events(&self) -> Vec<EventSummary> {
        self.inner.state.borrow().events.clone()
    }

    /// Looks up a visible event by id.
    #[must_use]
    pub fn event(&self, id: &EventId) -> Option<EventSummary> {
        self.inner
            .state
            .borrow()
            .events
            .iter()
            .find(|e| &e.id == id)
            .cloned()
    }

    /// Returns the visible events with their icons.
    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        let icons = &self.inner.config.icons;
        self.inner
            .state
            .borrow()
            .events
            .iter()
            .map(|e| Marker {
                id: e.id.clone(),
                position: e.position(),
                icon: icons.spec(e.icon_category).clone(),
            })
            .collect()
    }

    /// Returns the active period filter.
    #[must_use]
    pub fn period(&self) -> PeriodFilter {
        self.inner.state.borrow().period
    }

    /// Returns the last reported viewport.
    #[must_use]
    pub fn bounds(&self) -> Option<ViewportBounds> {
        self.inner.state.borrow().bounds
    }

    /// Returns a copy of the full state.
    #[must_use]
    pub fn snapshot(&self) -> SyncSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.inner.state.subscribe()
    }
}

impl<A: EventsApi> SyncInner<A> {
    /// Tags a query with the next generation and sends it.
    fn dispatch(self: &Arc<Self>, bounds: ViewportBounds, period: PeriodFilter) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.latest_generation += 1;
            generation = s.latest_generation;
            s.is_loading = true;
            s.bounds = Some(bounds);
            s.period = period;
        });

        tracing::debug!(generation, %bounds, %period, "bounds query dispatched");
        let _ = self.bus.publish(MapEvent::SyncDispatched {
            generation,
            bounds,
            period,
            timestamp: Utc::now(),
        });

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let query = BoundsQuery::new(&bounds, period);
            let result = inner.api.events_in_bounds(&query).await;
            inner.settle(generation, result);
        });
        generation
    }

    /// Applies a result if its generation is still the latest.
    fn settle(&self, generation: u64, result: Result<Vec<EventSummary>, ClientError>) {
        match result {
            Ok(events) => {
                let mut applied = None;
                self.state.send_if_modified(|s| {
                    if s.latest_generation != generation {
                        return false;
                    }
                    s.events = dedupe_by_id(events);
                    s.is_loading = false;
                    s.applied_generation = generation;
                    applied = Some(s.events.len());
                    true
                });

                match applied {
                    Some(count) => {
                        tracing::info!(generation, count, "visible events replaced");
                        let _ = self.bus.publish(MapEvent::EventsReplaced {
                            generation,
                            count,
                            timestamp: Utc::now(),
                        });
                    }
                    None => self.discard(generation),
                }
            }
            Err(err) => {
                let latest = self.state.send_if_modified(|s| {
                    if s.latest_generation != generation {
                        return false;
                    }
                    s.is_loading = false;
                    true
                });

                if latest {
                    tracing::warn!(
                        generation,
                        error = %err,
                        "bounds query failed, keeping markers"
                    );
                    let _ = self.bus.publish(MapEvent::SyncFailed {
                        generation,
                        reason: err.to_string(),
                        timestamp: Utc::now(),
                    });
                } else {
                    self.discard(generation);
                }
            }
        }
    }

    fn discard(&self, generation: u64) {
        tracing::debug!(generation, "discarding superseded bounds result");
        let _ = self.bus.publish(MapEvent::StaleResultDiscarded {
            kind: StaleKind::Sync,
            request: generation.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Keeps the first record for each id, preserving server order.
fn dedupe_by_id(events: Vec<EventSummary>) -> Vec<EventSummary> {
    let total = events.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<EventSummary> = events
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    if unique.len() != total {
        tracing::debug!(
            dropped = total - unique.len(),
            "duplicate event ids in bounds result"
        );
    }
    unique
}
