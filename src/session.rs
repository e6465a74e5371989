//! The map screen as one object.
//!
//! [`MapSession`] wires the bootstrapper, the viewport synchronizer, the
//! detail loader and the review store to one configuration and one
//! [`EventBus`], and exposes the commands a presentation layer issues.
//! Selecting an event is the only cross-component flow: the review store
//! follows the selection, never the other way round.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::api::EventsApi;
use crate::config::ClientConfig;
use crate::domain::{
    AuthIdentity, EventBus, EventDetail, EventId, GeoPoint, MapEvent, PeriodFilter,
    ViewportBounds,
};
use crate::error::ClientError;
use crate::service::{
    EventDetailLoader, GeoBootstrapper, LocationProvider, Marker, ReviewStore,
    ViewportEventSynchronizer,
};

/// Client-side state and commands of the map screen.
#[derive(Debug)]
pub struct MapSession<A, L> {
    config: Arc<ClientConfig>,
    bus: EventBus,
    bootstrap: GeoBootstrapper<L>,
    sync: ViewportEventSynchronizer<A>,
    detail: EventDetailLoader<A>,
    reviews: ReviewStore<A>,
    identity: watch::Sender<Option<AuthIdentity>>,
}

impl<A: EventsApi, L: LocationProvider> MapSession<A, L> {
    /// Builds every component around a fresh event bus.
    #[must_use]
    pub fn new(api: Arc<A>, location: Arc<L>, config: Arc<ClientConfig>) -> Self {
        let bus = EventBus::new(config.event_bus_capacity);
        let (identity, _) = watch::channel(None);
        Self {
            bootstrap: GeoBootstrapper::new(location, Arc::clone(&config), bus.clone()),
            sync: ViewportEventSynchronizer::new(
                Arc::clone(&api),
                Arc::clone(&config),
                bus.clone(),
            ),
            detail: EventDetailLoader::new(Arc::clone(&api), bus.clone()),
            reviews: ReviewStore::new(api, bus.clone()),
            identity,
            config,
            bus,
        }
    }

    /// Resolves the initial map center; see [`GeoBootstrapper`].
    pub async fn resolve_initial_center(&self) -> GeoPoint {
        self.bootstrap.resolve_initial_center().await
    }

    /// Reports a settled viewport; see [`ViewportEventSynchronizer::on_viewport_settled`].
    pub fn on_viewport_settled(&self, bounds: ViewportBounds, period: PeriodFilter) {
        self.sync.on_viewport_settled(bounds, period);
    }

    /// Switches the period filter.
    pub fn set_period(&self, period: PeriodFilter) {
        self.sync.set_period(period);
    }

    /// Selects an event: loads its detail, then its reviews.
    ///
    /// On failure the previous selection and its reviews stay in place and
    /// `None` is returned.
    pub async fn select_event(&self, id: &EventId) -> Option<EventDetail> {
        let detail = self.detail.load_detail(id).await?;
        let reviews = self.reviews.open(Some(detail.id.clone())).await;
        tracing::debug!(event_id = %detail.id, reviews = reviews.len(), "selection ready");
        Some(detail)
    }

    /// Drops the selection and tears down the review store.
    pub fn clear_selection(&self) {
        self.detail.clear();
        self.reviews.bind(None);
    }

    /// Submits a review of the selected event as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns a validation error when nobody is signed in, nothing is
    /// selected, the rating is outside 1..=5 or the comment is empty, and
    /// the transport error when the server refuses the review.
    pub async fn submit_review(&self, rating: u8, comment: &str) -> Result<(), ClientError> {
        let identity = self.identity();
        let event_id = self.detail.selected_id();
        self.reviews
            .submit(
                event_id.as_ref(),
                identity.as_ref().map(|i| &i.user_id),
                rating,
                comment,
            )
            .await
    }

    /// Replaces the signed-in identity; `None` signs out.
    pub fn set_identity(&self, identity: Option<AuthIdentity>) {
        self.identity.send_replace(identity);
    }

    /// Returns the signed-in identity.
    #[must_use]
    pub fn identity(&self) -> Option<AuthIdentity> {
        self.identity.borrow().clone()
    }

    /// Returns `true` when a user is signed in and may write reviews.
    #[must_use]
    pub fn can_review(&self) -> bool {
        self.identity.borrow().is_some()
    }

    /// Returns the name to greet, if signed in.
    #[must_use]
    pub fn greeting(&self) -> Option<String> {
        self.identity.borrow().as_ref().map(|i| i.username.clone())
    }

    /// Returns the user-location marker, armed only by a device fix.
    #[must_use]
    pub fn user_location(&self) -> Option<GeoPoint> {
        self.bootstrap.user_location()
    }

    /// Returns the markers to draw.
    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        self.sync.markers()
    }

    /// Subscribes to notifications from every component.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.bus.subscribe()
    }

    /// Returns the configuration the session was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the viewport synchronizer.
    #[must_use]
    pub const fn sync(&self) -> &ViewportEventSynchronizer<A> {
        &self.sync
    }

    /// Returns the detail loader.
    #[must_use]
    pub const fn detail(&self) -> &EventDetailLoader<A> {
        &self.detail
    }

    /// Returns the review store.
    #[must_use]
    pub const fn reviews(&self) -> &ReviewStore<A> {
        &self.reviews
    }
}
