//! Scripted [`EventsApi`] for unit tests.
//!
//! Each endpoint has a reply queue. A reply is either ready immediately or
//! gated on a oneshot the test completes later, which lets a test decide
//! the order in which concurrent requests settle. An empty queue answers
//! with an empty success.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

use super::{BoundsQuery, EventsApi, NewReviewRequest};
use crate::domain::{EventDetail, EventId, EventSummary, IconCategory, Review};
use crate::error::ClientError;

type Outcome<T> = Result<T, ClientError>;

#[derive(Debug)]
enum Reply<T> {
    Ready(Outcome<T>),
    Gated(oneshot::Receiver<Outcome<T>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Outcome<T> {
        match self {
            Self::Ready(outcome) => outcome,
            Self::Gated(rx) => rx.await.unwrap_or_else(|_| {
                Err(ClientError::Decode("gate dropped before reply".to_string()))
            }),
        }
    }
}

#[derive(Debug)]
struct Endpoint<Req, Res> {
    calls: Mutex<Vec<Req>>,
    replies: Mutex<VecDeque<Reply<Res>>>,
}

impl<Req: Clone, Res> Endpoint<Req, Res> {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, reply: Reply<Res>) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    fn ready(&self, outcome: Outcome<Res>) {
        self.push(Reply::Ready(outcome));
    }

    fn gate(&self) -> oneshot::Sender<Outcome<Res>> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Gated(rx));
        tx
    }

    fn record(&self, request: Req) -> Option<Reply<Res>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn calls(&self) -> Vec<Req> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Recording, scripted API double.
#[derive(Debug)]
pub(crate) struct MockApi {
    bounds: Endpoint<BoundsQuery, Vec<EventSummary>>,
    detail: Endpoint<EventId, EventDetail>,
    list: Endpoint<EventId, Vec<Review>>,
    submit: Endpoint<NewReviewRequest, ()>,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self {
            bounds: Endpoint::new(),
            detail: Endpoint::new(),
            list: Endpoint::new(),
            submit: Endpoint::new(),
        }
    }

    pub(crate) fn reply_bounds(&self, outcome: Outcome<Vec<EventSummary>>) {
        self.bounds.ready(outcome);
    }

    pub(crate) fn gate_bounds(&self) -> oneshot::Sender<Outcome<Vec<EventSummary>>> {
        self.bounds.gate()
    }

    pub(crate) fn bounds_calls(&self) -> Vec<BoundsQuery> {
        self.bounds.calls()
    }

    pub(crate) fn reply_detail(&self, outcome: Outcome<EventDetail>) {
        self.detail.ready(outcome);
    }

    pub(crate) fn gate_detail(&self) -> oneshot::Sender<Outcome<EventDetail>> {
        self.detail.gate()
    }

    pub(crate) fn detail_calls(&self) -> Vec<EventId> {
        self.detail.calls()
    }

    pub(crate) fn reply_list(&self, outcome: Outcome<Vec<Review>>) {
        self.list.ready(outcome);
    }

    pub(crate) fn gate_list(&self) -> oneshot::Sender<Outcome<Vec<Review>>> {
        self.list.gate()
    }

    pub(crate) fn list_calls(&self) -> Vec<EventId> {
        self.list.calls()
    }

    pub(crate) fn reply_submit(&self, outcome: Outcome<()>) {
        self.submit.ready(outcome);
    }

    pub(crate) fn gate_submit(&self) -> oneshot::Sender<Outcome<()>> {
        self.submit.gate()
    }

    pub(crate) fn submit_calls(&self) -> Vec<NewReviewRequest> {
        self.submit.calls()
    }
}

impl EventsApi for MockApi {
    async fn events_in_bounds(&self, query: &BoundsQuery) -> Outcome<Vec<EventSummary>> {
        match self.bounds.record(query.clone()) {
            Some(reply) => reply.resolve().await,
            None => Ok(Vec::new()),
        }
    }

    async fn event_detail(&self, id: &EventId) -> Outcome<EventDetail> {
        match self.detail.record(id.clone()) {
            Some(reply) => reply.resolve().await,
            None => Ok(detail(id.clone(), "untitled")),
        }
    }

    async fn list_reviews(&self, event_id: &EventId) -> Outcome<Vec<Review>> {
        match self.list.record(event_id.clone()) {
            Some(reply) => reply.resolve().await,
            None => Ok(Vec::new()),
        }
    }

    async fn submit_review(&self, review: &NewReviewRequest) -> Outcome<()> {
        match self.submit.record(review.clone()) {
            Some(reply) => reply.resolve().await,
            None => Ok(()),
        }
    }
}

/// A marker at `(lat, lng)` with the default icon.
pub(crate) fn summary(id: i64, lat: f64, lng: f64) -> EventSummary {
    EventSummary {
        id: EventId::from(id),
        lat,
        lng,
        icon_category: IconCategory::Other,
    }
}

/// A detail record with only a title.
pub(crate) fn detail(id: EventId, title: &str) -> EventDetail {
    EventDetail {
        id,
        lat: 35.0,
        lng: 139.0,
        icon_category: IconCategory::Festival,
        title: title.to_string(),
        site_url: None,
        category: None,
        start_date: None,
        end_date: None,
        location: None,
    }
}

/// A review with a numeric id.
pub(crate) fn review(id: i64, event_id: &EventId, rating: u8, comment: &str) -> Review {
    Review {
        id: id.into(),
        user_id: crate::domain::UserId::new("u-1"),
        event_id: event_id.clone(),
        rating: crate::domain::Rating::new(rating).unwrap_or_default(),
        comment: comment.to_string(),
        user_name: None,
    }
}

/// A transient server failure.
pub(crate) fn server_error() -> ClientError {
    ClientError::Status {
        status: 500,
        body: "boom".to_string(),
    }
}

/// Receives notifications until one matches `pred`.
///
/// Panics after five (virtual) seconds so a broken test fails instead of
/// hanging.
#[allow(clippy::panic)]
pub(crate) async fn wait_for<F>(
    rx: &mut tokio::sync::broadcast::Receiver<crate::domain::MapEvent>,
    mut pred: F,
) -> crate::domain::MapEvent
where
    F: FnMut(&crate::domain::MapEvent) -> bool,
{
    let found = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        crate::domain::next_matching(rx, &mut pred),
    )
    .await;
    match found {
        Ok(Some(event)) => event,
        _ => panic!("expected notification did not arrive"),
    }
}

/// Yields until the recorded call count of an endpoint reaches `n`.
pub(crate) async fn settle_calls<F>(mut count: F, n: usize)
where
    F: FnMut() -> usize,
{
    for _ in 0..100 {
        if count() >= n {
            return;
        }
        tokio::task::yield_now().await;
    }
}
