//! # mapyou-client
//!
//! Client core of a map-centric event discovery app.
//!
//! The crate keeps the markers shown on a map in step with the visible
//! viewport and a period filter, loads the full record of a selected event,
//! and lists and submits reviews for it. Rendering, authentication and the
//! device location service are collaborators supplied by the caller.
//!
//! ## Architecture
//!
//! ```text
//! Presentation layer
//!     │
//!     ├── MapSession (session)
//!     │
//!     ├── GeoBootstrapper ── LocationProvider
//!     ├── ViewportEventSynchronizer ── Debouncer
//!     ├── EventDetailLoader
//!     ├── ReviewStore
//!     │        │
//!     │        └── EventBus (domain/) ──▶ MapEvent subscribers
//!     │
//!     └── EventsApi (api/) ── HttpEventsApi ──▶ REST backend
//! ```

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod session;

pub use session::MapSession;
