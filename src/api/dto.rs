//! Request shapes sent to the remote API.

use serde::Serialize;

use crate::domain::{EventId, PeriodFilter, ReviewDraft, UserId, ViewportBounds};

/// Field projection requested from the bounds endpoint.
pub const SUMMARY_FIELDS: &str = "id,lat,lng,icon_category";

/// Query string of `GET /events/bounds`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsQuery {
    /// Northern edge.
    pub north: f64,
    /// Southern edge.
    pub south: f64,
    /// Eastern edge.
    pub east: f64,
    /// Western edge.
    pub west: f64,
    /// Comma-separated field projection.
    pub fields: &'static str,
    /// Period filter.
    pub period: PeriodFilter,
}

impl BoundsQuery {
    /// Builds the query for a viewport and period.
    #[must_use]
    pub const fn new(bounds: &ViewportBounds, period: PeriodFilter) -> Self {
        Self {
            north: bounds.north(),
            south: bounds.south(),
            east: bounds.east(),
            west: bounds.west(),
            fields: SUMMARY_FIELDS,
            period,
        }
    }
}

/// Body of `POST /reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReviewRequest {
    /// Author.
    pub user_id: UserId,
    /// Reviewed event.
    pub event_id: EventId,
    /// Star rating, 1..=5.
    pub rating: u8,
    /// Review text.
    pub comment: String,
}

impl From<ReviewDraft> for NewReviewRequest {
    fn from(draft: ReviewDraft) -> Self {
        Self {
            user_id: draft.user_id,
            event_id: draft.event_id,
            rating: draft.rating.get(),
            comment: draft.comment,
        }
    }
}
