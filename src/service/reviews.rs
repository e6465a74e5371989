//! Per-event review list and submission.
//!
//! [`ReviewStore`] is bound to at most one event at a time and moves
//! through `Idle → Loading → Ready | Error`. Binding a different event (or
//! none) resets it to `Idle` and drops the cached list and the form.
//!
//! The list is only trusted after a round trip: a successful submission
//! resets the form and lists again rather than inserting locally, so the
//! displayed reviews always match what the server holds. Any result that
//! arrives for an event that is no longer bound is dropped.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::api::{EventsApi, NewReviewRequest};
use crate::domain::{
    AuthIdentity, EventBus, EventId, MapEvent, Rating, Review, ReviewDraft, StaleKind, UserId,
};
use crate::error::{ClientError, ValidationError};

/// Lifecycle of the store for the bound event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewStatus {
    /// Nothing requested yet, or no event bound.
    #[default]
    Idle,
    /// A list request for the bound event is in flight.
    Loading,
    /// The list reflects the server; possibly empty.
    Ready,
    /// The last list request failed.
    Error,
}

/// Last failure, kept for inline display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewNotice {
    /// Input was rejected locally.
    Validation(ValidationError),
    /// The server or network failed.
    Network(String),
}

/// Review input form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewForm {
    /// Selected rating, 1..=5.
    pub rating: u8,
    /// Comment text.
    pub comment: String,
}

impl Default for ReviewForm {
    fn default() -> Self {
        Self {
            rating: Rating::MAX.get(),
            comment: String::new(),
        }
    }
}

/// Observable state of the review store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSnapshot {
    /// Bound event.
    pub event_id: Option<EventId>,
    /// Lifecycle state.
    pub status: ReviewStatus,
    /// Reviews in server order.
    pub reviews: Vec<Review>,
    /// Input form.
    pub form: ReviewForm,
    /// `true` while a submission for the bound event is in flight.
    pub submitting: bool,
    /// Last failure, cleared on the next attempt.
    pub notice: Option<ReviewNotice>,
    /// Number of the latest list request or rebind; older answers are ignored.
    pub latest_list: u64,
}

/// Review cache and submitter for the selected event.
///
/// Cheap to clone; clones share state.
#[derive(Debug)]
pub struct ReviewStore<A> {
    inner: Arc<ReviewInner<A>>,
}

impl<A> Clone for ReviewStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct ReviewInner<A> {
    api: Arc<A>,
    bus: EventBus,
    state: watch::Sender<ReviewSnapshot>,
}

impl<A: EventsApi> ReviewStore<A> {
    /// Creates an unbound store.
    #[must_use]
    pub fn new(api: Arc<A>, bus: EventBus) -> Self {
        let (state, _) = watch::channel(ReviewSnapshot::default());
        Self {
            inner: Arc::new(ReviewInner { api, bus, state }),
        }
    }

    /// Binds the store to `event_id`, resetting it if the event changed.
    ///
    /// Returns `true` if the binding changed. `None` tears the store down.
    pub fn bind(&self, event_id: Option<EventId>) -> bool {
        let changed = self.inner.state.send_if_modified(|s| {
            if s.event_id == event_id {
                return false;
            }
            *s = ReviewSnapshot {
                event_id: event_id.clone(),
                latest_list: s.latest_list + 1,
                ..ReviewSnapshot::default()
            };
            true
        });
        if changed {
            tracing::debug!(
                event_id = ?event_id.as_ref().map(ToString::to_string),
                "review store rebound"
            );
        }
        changed
    }

    /// Binds the store to `event_id` and, if it changed to an event, lists
    /// its reviews.
    pub async fn open(&self, event_id: Option<EventId>) -> Vec<Review> {
        if !self.bind(event_id.clone()) {
            return self.reviews();
        }
        match event_id {
            Some(id) => self.list(&id).await,
            None => Vec::new(),
        }
    }

    /// Fetches the reviews of the bound event, replacing the cache.
    ///
    /// Returns the applied list; empty if `event_id` is not the bound event,
    /// the request failed, or the binding changed or a newer list was
    /// requested before the answer came.
    pub async fn list(&self, event_id: &EventId) -> Vec<Review> {
        let Some(request) = self.inner.begin_list(event_id) else {
            tracing::debug!(%event_id, "ignoring list for an unbound event");
            return Vec::new();
        };
        let inner = Arc::clone(&self.inner);
        let event_id = event_id.clone();
        tokio::spawn(async move { inner.fetch_list(event_id, request).await })
            .await
            .unwrap_or_else(|err| {
                tracing::error!(error = %err, "review list task did not complete");
                Vec::new()
            })
    }

    /// Submits a review.
    ///
    /// Input is validated first; a rejected draft never reaches the network.
    /// On success for the still-bound event the form is reset and the list
    /// is fetched again. If the binding changed while the request was in
    /// flight, the outcome is returned but the store is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for missing identity, missing
    /// event, a rating outside 1..=5 or an empty comment, and the transport
    /// error when the server refuses the review.
    pub async fn submit(
        &self,
        event_id: Option<&EventId>,
        user_id: Option<&UserId>,
        rating: u8,
        comment: &str,
    ) -> Result<(), ClientError> {
        let draft = match ReviewDraft::validate(user_id, event_id, rating, comment) {
            Ok(draft) => draft,
            Err(err) => {
                self.inner.reject_locally(event_id, &err);
                return Err(err.into());
            }
        };

        let event_id = draft.event_id.clone();
        self.inner.state.send_if_modified(|s| {
            if s.event_id.as_ref() != Some(&event_id) {
                return false;
            }
            s.submitting = true;
            s.notice = None;
            true
        });

        let inner = Arc::clone(&self.inner);
        let request = NewReviewRequest::from(draft);
        tokio::spawn(async move { inner.send_review(request).await })
            .await
            .unwrap_or_else(|err| Err(ClientError::Decode(format!("submit task failed: {err}"))))
    }

    /// Submits the form contents for the bound event as `identity`.
    ///
    /// # Errors
    ///
    /// See [`Self::submit`].
    pub async fn submit_form(&self, identity: Option<&AuthIdentity>) -> Result<(), ClientError> {
        let (event_id, form) = {
            let s = self.inner.state.borrow();
            (s.event_id.clone(), s.form.clone())
        };
        self.submit(
            event_id.as_ref(),
            identity.map(|i| &i.user_id),
            form.rating,
            &form.comment,
        )
        .await
    }

    /// Sets the form rating.
    pub fn set_rating(&self, rating: u8) {
        self.inner.state.send_modify(|s| s.form.rating = rating);
    }

    /// Sets the form comment.
    pub fn set_comment(&self, comment: impl Into<String>) {
        let comment = comment.into();
        self.inner.state.send_modify(|s| s.form.comment = comment);
    }

    /// Returns the bound event.
    #[must_use]
    pub fn event_id(&self) -> Option<EventId> {
        self.inner.state.borrow().event_id.clone()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn status(&self) -> ReviewStatus {
        self.inner.state.borrow().status
    }

    /// Returns the cached reviews in server order.
    #[must_use]
    pub fn reviews(&self) -> Vec<Review> {
        self.inner.state.borrow().reviews.clone()
    }

    /// Returns the form contents.
    #[must_use]
    pub fn form(&self) -> ReviewForm {
        self.inner.state.borrow().form.clone()
    }

    /// Returns the last failure.
    #[must_use]
    pub fn notice(&self) -> Option<ReviewNotice> {
        self.inner.state.borrow().notice.clone()
    }

    /// Returns a copy of the full state.
    #[must_use]
    pub fn snapshot(&self) -> ReviewSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ReviewSnapshot> {
        self.inner.state.subscribe()
    }
}

impl<A: EventsApi> ReviewInner<A> {
    fn is_bound_to(&self, event_id: &EventId) -> bool {
        self.state.borrow().event_id.as_ref() == Some(event_id)
    }

    /// Moves to `Loading` and numbers a new list request if `event_id` is
    /// bound.
    fn begin_list(&self, event_id: &EventId) -> Option<u64> {
        let mut request = None;
        self.state.send_if_modified(|s| {
            if s.event_id.as_ref() != Some(event_id) {
                return false;
            }
            s.latest_list += 1;
            s.status = ReviewStatus::Loading;
            request = Some(s.latest_list);
            true
        });
        request
    }

    async fn fetch_list(&self, event_id: EventId, request: u64) -> Vec<Review> {
        let result = self.api.list_reviews(&event_id).await;
        match result {
            Ok(reviews) => {
                let count = reviews.len();
                let mut applied = None;
                self.state.send_if_modified(|s| {
                    if s.event_id.as_ref() != Some(&event_id) || s.latest_list != request {
                        return false;
                    }
                    s.reviews = reviews;
                    s.status = ReviewStatus::Ready;
                    applied = Some(s.reviews.clone());
                    true
                });
                let Some(applied) = applied else {
                    self.discard(StaleKind::ReviewList, &event_id);
                    return Vec::new();
                };
                tracing::debug!(%event_id, count, "reviews loaded");
                let _ = self.bus.publish(MapEvent::ReviewsLoaded {
                    event_id,
                    count,
                    timestamp: Utc::now(),
                });
                applied
            }
            Err(err) => {
                let current = self.state.send_if_modified(|s| {
                    if s.event_id.as_ref() != Some(&event_id) || s.latest_list != request {
                        return false;
                    }
                    s.status = ReviewStatus::Error;
                    s.notice = Some(ReviewNotice::Network(err.to_string()));
                    true
                });
                if !current {
                    self.discard(StaleKind::ReviewList, &event_id);
                    return Vec::new();
                }
                tracing::warn!(%event_id, error = %err, "listing reviews failed");
                let _ = self.bus.publish(MapEvent::ReviewsFailed {
                    event_id,
                    reason: err.to_string(),
                    timestamp: Utc::now(),
                });
                Vec::new()
            }
        }
    }

    async fn send_review(&self, request: NewReviewRequest) -> Result<(), ClientError> {
        let event_id = request.event_id.clone();
        let result = self.api.submit_review(&request).await;

        if !self.is_bound_to(&event_id) {
            self.discard(StaleKind::ReviewSubmit, &event_id);
            return result;
        }

        match result {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.submitting = false;
                    s.form = ReviewForm::default();
                });
                tracing::info!(%event_id, rating = request.rating, "review submitted");
                let _ = self.bus.publish(MapEvent::ReviewSubmitted {
                    event_id: event_id.clone(),
                    timestamp: Utc::now(),
                });
                if let Some(list) = self.begin_list(&event_id) {
                    let _ = self.fetch_list(event_id, list).await;
                }
                Ok(())
            }
            Err(err) => {
                self.state.send_modify(|s| {
                    s.submitting = false;
                    s.notice = Some(ReviewNotice::Network(err.to_string()));
                });
                tracing::warn!(%event_id, error = %err, "review submission failed");
                let _ = self.bus.publish(MapEvent::ReviewRejected {
                    event_id: Some(event_id),
                    reason: err.to_string(),
                    local: false,
                    timestamp: Utc::now(),
                });
                Err(err)
            }
        }
    }

    fn reject_locally(&self, event_id: Option<&EventId>, err: &ValidationError) {
        self.state.send_if_modified(|s| {
            if s.event_id.as_ref() != event_id {
                return false;
            }
            s.notice = Some(ReviewNotice::Validation(err.clone()));
            true
        });
        tracing::debug!(error = %err, "review rejected before sending");
        let _ = self.bus.publish(MapEvent::ReviewRejected {
            event_id: event_id.cloned(),
            reason: err.to_string(),
            local: true,
            timestamp: Utc::now(),
        });
    }

    fn discard(&self, kind: StaleKind, event_id: &EventId) {
        tracing::debug!(?kind, %event_id, "discarding review result for unbound event");
        let _ = self.bus.publish(MapEvent::StaleResultDiscarded {
            kind,
            request: event_id.to_string(),
            timestamp: Utc::now(),
        });
    }
}
