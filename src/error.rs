//! Client error types and their failure taxonomy.
//!
//! [`ClientError`] is the central error type of the crate. Every variant
//! belongs to one [`ErrorKind`], which decides how a component reacts:
//! transient failures freeze state at last-known-good, validation failures
//! are shown inline without touching the network.

/// Coarse failure category used to pick a recovery policy.
///
/// | Kind          | Origin                              | Reaction                       |
/// |---------------|-------------------------------------|--------------------------------|
/// | Validation    | missing identity / event / comment  | inline message, no request     |
/// | Transient     | transport, non-2xx, bad payload     | log, retain previous state     |
/// | Configuration | unusable settings at startup        | reported by the binary         |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local input was rejected before any request was made.
    Validation,
    /// The remote API could not be reached or answered unusably.
    Transient,
    /// Settings could not be turned into a working client.
    Configuration,
}

/// Local validation failures for review submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No authenticated user identity is available.
    #[error("sign in to post a review")]
    NotAuthenticated,

    /// No event is selected to attach the review to.
    #[error("no event selected")]
    NoEventSelected,

    /// The review comment is empty.
    #[error("comment must not be empty")]
    EmptyComment,

    /// The rating lies outside 1..=5.
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
}

/// Failures reported by a device location service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The user refused location access.
    #[error("location permission denied")]
    PermissionDenied,

    /// No position was produced within the configured timeout.
    #[error("location request timed out")]
    Timeout,

    /// The device has no usable location service.
    #[error("location service unavailable")]
    Unavailable,
}

/// Errors produced by the remote API client and the review subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text, possibly empty.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Configuration could not be loaded or applied.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Input was rejected locally; no request was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl ClientError {
    /// Returns the numeric error code for this variant.
    ///
    /// 1xxx validation, 2xxx remote, 3xxx configuration.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(ValidationError::NotAuthenticated) => 1001,
            Self::Validation(ValidationError::NoEventSelected) => 1002,
            Self::Validation(ValidationError::EmptyComment) => 1003,
            Self::Validation(ValidationError::RatingOutOfRange(_)) => 1004,
            Self::Transport(_) => 2001,
            Self::Status { .. } => 2002,
            Self::Decode(_) => 2003,
            Self::Config(_) => 3001,
        }
    }

    /// Returns the failure category for this variant.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Transport(_) | Self::Status { .. } | Self::Decode(_) => ErrorKind::Transient,
            Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if the error was raised before any request was sent.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation)
    }
}
