//! `reqwest` implementation of [`EventsApi`].

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use super::{BoundsQuery, EventsApi, NewReviewRequest};
use crate::config::ClientConfig;
use crate::domain::{EventDetail, EventId, EventSummary, Review};
use crate::error::ClientError;

/// HTTP client for the events/reviews API.
///
/// No client-side request timeout is set: in-flight calls run until the
/// server answers, and callers decide whether the answer is still wanted.
#[derive(Debug, Clone)]
pub struct HttpEventsApi {
    client: Client,
    base_url: Url,
}

impl HttpEventsApi {
    /// Builds a client for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the TLS backend cannot be
    /// initialised, or [`ClientError::Config`] if the base URL cannot carry
    /// path segments.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| ClientError::Config(format!("API_BASE_URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "API_BASE_URL {base_url} cannot carry a path"
            )));
        }
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self { client, base_url })
    }

    /// Appends percent-encoded path segments to the base URL.
    ///
    /// Opaque ids go in as a single segment, so `/`, `?` and `#` inside an
    /// id stay part of it.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Maps non-2xx responses to [`ClientError::Status`] with the body text.
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Reads a JSON body, reporting decode failures separately from transport.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

impl EventsApi for HttpEventsApi {
    async fn events_in_bounds(
        &self,
        query: &BoundsQuery,
    ) -> Result<Vec<EventSummary>, ClientError> {
        let response = self
            .client
            .get(self.url(&["events", "bounds"]))
            .query(query)
            .send()
            .await?;
        let events: Vec<EventSummary> = decode(ensure_success(response).await?).await?;
        tracing::debug!(count = events.len(), period = %query.period, "bounds query answered");
        Ok(events)
    }

    async fn event_detail(&self, id: &EventId) -> Result<EventDetail, ClientError> {
        let response = self
            .client
            .get(self.url(&["events", &id.to_string()]))
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }

    async fn list_reviews(&self, event_id: &EventId) -> Result<Vec<Review>, ClientError> {
        let response = self
            .client
            .get(self.url(&["reviews", &event_id.to_string()]))
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }

    async fn submit_review(&self, review: &NewReviewRequest) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url(&["reviews"]))
            .json(review)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_base_and_path() {
        let Ok(config) = ClientConfig::default().with_api_base_url("https://api.example.com/")
        else {
            panic!("valid url");
        };
        let Ok(api) = HttpEventsApi::new(&config) else {
            panic!("client builds");
        };
        assert_eq!(api.url(&["reviews"]).as_str(), "https://api.example.com/reviews");
        assert_eq!(
            api.url(&["events", &EventId::from("a b").to_string()]).as_str(),
            "https://api.example.com/events/a%20b"
        );
    }

    #[test]
    fn ids_are_a_single_escaped_segment() {
        let Ok(config) = ClientConfig::default().with_api_base_url("https://api.example.com/v1")
        else {
            panic!("valid url");
        };
        let Ok(api) = HttpEventsApi::new(&config) else {
            panic!("client builds");
        };
        let id = EventId::from("a/b?c=1#d").to_string();
        assert_eq!(
            api.url(&["events", &id]).as_str(),
            "https://api.example.com/v1/events/a%2Fb%3Fc=1%23d"
        );
    }
}
