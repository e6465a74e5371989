//! Client configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). The resulting [`ClientConfig`] is immutable and shared by
//! every component as an `Arc`, replacing process-wide mutable settings
//! such as the API base URL or the icon table.

use std::time::Duration;

use crate::domain::{GeoPoint, IconCatalog, PeriodFilter};
use crate::error::ClientError;

/// Tokyo Station, used when no device position is available.
pub const DEFAULT_FALLBACK_CENTER: GeoPoint = GeoPoint::new(35.6812, 139.7671);

/// Parameters passed to the device location service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationConfig {
    /// Request a high-accuracy fix.
    pub high_accuracy: bool,
    /// Give up after this long.
    pub timeout: Duration,
    /// Accept a cached position up to this old.
    pub max_age: Duration,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_millis(3_000),
            max_age: Duration::from_millis(300_000),
        }
    }
}

/// Top-level client configuration.
///
/// Loaded once at startup via [`ClientConfig::from_env`], or built from
/// [`ClientConfig::default`] in tests.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the events/reviews API, without a trailing slash.
    pub api_base_url: String,

    /// Quiet period after the last viewport change before a bounds query fires.
    pub sync_debounce: Duration,

    /// Device location request parameters.
    pub geolocation: GeolocationConfig,

    /// Center used when the device position is unavailable.
    pub fallback_center: GeoPoint,

    /// Period filter active before the user picks one.
    pub default_period: PeriodFilter,

    /// Capacity of the [`crate::domain::EventBus`] broadcast channel.
    pub event_bus_capacity: usize,

    /// User agent sent with every HTTP request.
    pub user_agent: String,

    /// Marker icon table.
    pub icons: IconCatalog,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            sync_debounce: Duration::from_millis(500),
            geolocation: GeolocationConfig::default(),
            fallback_center: DEFAULT_FALLBACK_CENTER,
            default_period: PeriodFilter::default(),
            event_bus_capacity: 1_024,
            user_agent: concat!("mapyou-client/", env!("CARGO_PKG_VERSION")).to_string(),
            icons: IconCatalog::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the defaults when a variable is not set or a numeric
    /// value does not parse. Calls `dotenvy::dotenv().ok()` to optionally
    /// load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `API_BASE_URL` is not a valid
    /// absolute URL or `DEFAULT_PERIOD` is not a known period.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let api_base_url = match std::env::var("API_BASE_URL") {
            Ok(raw) => normalize_base_url(&raw)?,
            Err(_) => defaults.api_base_url,
        };

        let default_period = match std::env::var("DEFAULT_PERIOD") {
            Ok(raw) => raw.parse().map_err(ClientError::Config)?,
            Err(_) => defaults.default_period,
        };

        let sync_debounce = Duration::from_millis(parse_env("SYNC_DEBOUNCE_MS", 500));

        let geolocation = GeolocationConfig {
            high_accuracy: parse_env_bool("GEOLOCATION_HIGH_ACCURACY", false),
            timeout: Duration::from_millis(parse_env("GEOLOCATION_TIMEOUT_MS", 3_000)),
            max_age: Duration::from_millis(parse_env("GEOLOCATION_MAX_AGE_MS", 300_000)),
        };

        let fallback_center = GeoPoint::new(
            parse_env("FALLBACK_LAT", DEFAULT_FALLBACK_CENTER.lat),
            parse_env("FALLBACK_LNG", DEFAULT_FALLBACK_CENTER.lng),
        );

        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity);
        let user_agent = std::env::var("HTTP_USER_AGENT").unwrap_or(defaults.user_agent);

        Ok(Self {
            api_base_url,
            sync_debounce,
            geolocation,
            fallback_center,
            default_period,
            event_bus_capacity,
            user_agent,
            icons: defaults.icons,
        })
    }

    /// Returns a copy with a different API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `url` is not a valid absolute URL.
    pub fn with_api_base_url(mut self, url: &str) -> Result<Self, ClientError> {
        self.api_base_url = normalize_base_url(url)?;
        Ok(self)
    }
}

/// Validates `raw` as an absolute URL and strips trailing slashes.
fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed)
        .map_err(|e| ClientError::Config(format!("API_BASE_URL {trimmed:?}: {e}")))?;
    Ok(trimmed.to_string())
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
