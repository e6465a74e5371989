//! Domain layer: value types, event records, reviews and notifications.
//!
//! Everything here is plain data plus the [`EventBus`]. No type in this
//! module performs I/O.

pub mod event;
pub mod event_bus;
pub mod geo;
pub mod icon;
pub mod map_event;
pub mod period;
pub mod review;

pub use event::{EventDetail, EventId, EventSummary, OpaqueId};
pub use event_bus::{EventBus, next_matching};
pub use geo::{GeoPoint, ViewportBounds};
pub use icon::{IconCatalog, IconCategory, IconSpec};
pub use map_event::{CenterSource, MapEvent, StaleKind};
pub use period::PeriodFilter;
pub use review::{AuthIdentity, Rating, Review, ReviewDraft, ReviewId, UserId};
