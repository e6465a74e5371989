//! Reviews, ratings and the authenticated identity that writes them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::event::{EventId, OpaqueId};
use crate::error::ValidationError;

/// Unique identifier of a review, assigned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(OpaqueId);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for ReviewId {
    fn from(n: i64) -> Self {
        Self(OpaqueId::Number(n))
    }
}

/// Identifier of an authenticated user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a provider-issued user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signed-in user as supplied by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    /// Display name.
    pub username: String,
    /// Stable user identifier.
    pub user_id: UserId,
}

impl AuthIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(username: impl Into<String>, user_id: UserId) -> Self {
        Self {
            username: username.into(),
            user_id,
        }
    }
}

/// A star rating in 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Highest rating; also the form default.
    pub const MAX: Self = Self(5);

    /// Validates a raw rating.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RatingOutOfRange`] outside 1..=5.
    pub const fn new(value: u8) -> Result<Self, ValidationError> {
        if value >= 1 && value <= 5 {
            Ok(Self(value))
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Renders the rating as five filled or hollow stars.
    #[must_use]
    pub fn stars(self) -> String {
        let filled = usize::from(self.0);
        let hollow = 5usize.saturating_sub(filled);
        format!("{}{}", "★".repeat(filled), "☆".repeat(hollow))
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::MAX
    }
}

impl TryFrom<u8> for Rating {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// A review as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review identifier.
    pub id: ReviewId,
    /// Author.
    pub user_id: UserId,
    /// Reviewed event.
    pub event_id: EventId,
    /// Star rating.
    pub rating: Rating,
    /// Review text.
    pub comment: String,
    /// Author display name, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl Review {
    /// Returns the author display name, or `"anonymous"`.
    #[must_use]
    pub fn author(&self) -> &str {
        self.user_name.as_deref().unwrap_or("anonymous")
    }
}

/// A review that passed local validation and is ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    /// Author.
    pub user_id: UserId,
    /// Reviewed event.
    pub event_id: EventId,
    /// Star rating.
    pub rating: Rating,
    /// Non-empty review text.
    pub comment: String,
}

impl ReviewDraft {
    /// Validates submission input without touching the network.
    ///
    /// Checks run in order: identity, event, rating, comment.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] that applies.
    pub fn validate(
        user_id: Option<&UserId>,
        event_id: Option<&EventId>,
        rating: u8,
        comment: &str,
    ) -> Result<Self, ValidationError> {
        let user_id = user_id.ok_or(ValidationError::NotAuthenticated)?;
        let event_id = event_id.ok_or(ValidationError::NoEventSelected)?;
        let rating = Rating::new(rating)?;
        if comment.is_empty() {
            return Err(ValidationError::EmptyComment);
        }
        Ok(Self {
            user_id: user_id.clone(),
            event_id: event_id.clone(),
            rating,
            comment: comment.to_string(),
        })
    }
}
