//! Remote API collaborator.
//!
//! [`EventsApi`] is the fixed contract the core consumes:
//!
//! ```text
//! GET  /events/bounds?north&south&east&west&fields=id,lat,lng,icon_category&period=…
//! GET  /events/{id}
//! GET  /reviews/{event_id}
//! POST /reviews        {user_id, event_id, rating, comment}
//! ```
//!
//! [`HttpEventsApi`] implements it over `reqwest`. Components are generic
//! over the trait so tests can script replies.

use std::future::Future;

use crate::domain::{EventDetail, EventId, EventSummary, Review};
use crate::error::ClientError;

pub mod dto;
pub mod http;

#[cfg(test)]
pub(crate) mod mock;

pub use dto::{BoundsQuery, NewReviewRequest};
pub use http::HttpEventsApi;

/// Remote events and reviews API.
///
/// Implementations must be cheap to share behind an `Arc`; every call is
/// independent and none is cancelled by the caller once started.
pub trait EventsApi: Send + Sync + 'static {
    /// Fetches lightweight records of events inside the bounds for a period.
    ///
    /// # Errors
    ///
    /// Returns a transient [`ClientError`] on transport, status or decode
    /// failure.
    fn events_in_bounds(
        &self,
        query: &BoundsQuery,
    ) -> impl Future<Output = Result<Vec<EventSummary>, ClientError>> + Send;

    /// Fetches the full record of one event.
    ///
    /// # Errors
    ///
    /// Returns a transient [`ClientError`] on transport, status or decode
    /// failure.
    fn event_detail(
        &self,
        id: &EventId,
    ) -> impl Future<Output = Result<EventDetail, ClientError>> + Send;

    /// Lists the reviews of one event in server order.
    ///
    /// # Errors
    ///
    /// Returns a transient [`ClientError`] on transport, status or decode
    /// failure.
    fn list_reviews(
        &self,
        event_id: &EventId,
    ) -> impl Future<Output = Result<Vec<Review>, ClientError>> + Send;

    /// Appends a review.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] carrying the response text when the
    /// server refuses the review, or another transient error.
    fn submit_review(
        &self,
        review: &NewReviewRequest,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}
