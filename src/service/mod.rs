//! Service layer: the stateful components behind the map screen.
//!
//! Each component owns one slice of state in a [`tokio::sync::watch`]
//! channel, talks to the backend through [`crate::api::EventsApi`], and
//! reports what happened on the shared [`crate::domain::EventBus`].

pub mod bootstrap;
pub mod debounce;
pub mod detail;
pub mod reviews;
pub mod sync;

pub use bootstrap::{
    FixedLocation, GeoBootstrapper, InitialCenter, LocationOptions, LocationProvider,
    NoLocationService,
};
pub use debounce::Debouncer;
pub use detail::{DetailSnapshot, EventDetailLoader};
pub use reviews::{ReviewForm, ReviewNotice, ReviewSnapshot, ReviewStatus, ReviewStore};
pub use sync::{Marker, SyncSnapshot, ViewportEventSynchronizer};
