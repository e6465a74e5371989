//! Event records: the lightweight marker shape and the full detail shape.
//!
//! [`EventSummary`] is what the bounds query returns and what the map
//! renders. [`EventDetail`] is fetched on marker selection and never
//! cached between selections.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use super::{GeoPoint, IconCategory};

/// Opaque identifier assigned by the remote API.
///
/// The server may use numbers or strings; the wire representation is
/// kept so identifiers go back on the wire exactly as they arrived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpaqueId {
    /// Numeric identifier.
    Number(i64),
    /// String identifier.
    Text(String),
}

impl fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Unique identifier of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(OpaqueId);

impl EventId {
    /// Returns the inner [`OpaqueId`].
    #[must_use]
    pub const fn as_opaque(&self) -> &OpaqueId {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for EventId {
    fn from(n: i64) -> Self {
        Self(OpaqueId::Number(n))
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(OpaqueId::Text(s.to_string()))
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(OpaqueId::Text(s))
    }
}

/// Lightweight event record rendered as a map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event identifier, unique within a result set.
    pub id: EventId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Marker icon category.
    #[serde(default)]
    pub icon_category: IconCategory,
}

impl EventSummary {
    /// Returns the marker position.
    #[must_use]
    pub const fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Full event record shown for the selected marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    /// Event identifier.
    pub id: EventId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Marker icon category.
    #[serde(default)]
    pub icon_category: IconCategory,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Official website.
    #[serde(default)]
    pub site_url: Option<String>,
    /// Free-form category name.
    #[serde(default)]
    pub category: Option<String>,
    /// First day of the event.
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    /// Last day of the event.
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    /// Venue description.
    #[serde(default)]
    pub location: Option<String>,
}

impl EventDetail {
    /// Returns the marker position.
    #[must_use]
    pub const fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Projects the detail back to the marker shape.
    #[must_use]
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id.clone(),
            lat: self.lat,
            lng: self.lng,
            icon_category: self.icon_category,
        }
    }

    /// Returns the running period, only when both ends are known.
    #[must_use]
    pub fn schedule(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start_date?, self.end_date?))
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 or a naive `YYYY-MM-DDTHH:MM:SS`.
/// Anything else decodes as `None`.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    tracing::debug!(raw, "ignoring unparseable event date");
    None
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn summary_accepts_numeric_and_string_ids() {
        let json = r#"[
            {"id": 7, "lat": 35.1, "lng": 139.2, "icon_category": 1},
            {"id": "evt-9", "lat": 35.3, "lng": 139.4, "icon_category": 2}
        ]"#;
        let Ok(events) = serde_json::from_str::<Vec<EventSummary>>(json) else {
            panic!("valid summaries");
        };
        let ids: Vec<String> = events.iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["7", "evt-9"]);
        assert_eq!(events.first().map(|e| e.icon_category), Some(IconCategory::Fireworks));
    }

    #[test]
    fn bad_icon_codes_do_not_fail_the_batch() {
        let json = r#"[
            {"id": 1, "lat": 35.1, "lng": 139.2, "icon_category": 1},
            {"id": 2, "lat": 35.2, "lng": 139.3, "icon_category": null},
            {"id": 3, "lat": 35.3, "lng": 139.4, "icon_category": 300}
        ]"#;
        let Ok(events) = serde_json::from_str::<Vec<EventSummary>>(json) else {
            panic!("one bad icon code must not reject the batch");
        };
        let icons: Vec<IconCategory> = events.iter().map(|e| e.icon_category).collect();
        assert_eq!(
            icons,
            vec![IconCategory::Fireworks, IconCategory::Other, IconCategory::Other]
        );
    }

    #[test]
    fn ids_serialize_in_their_wire_shape() {
        assert_eq!(serde_json::to_string(&EventId::from(7)).unwrap_or_default(), "7");
        assert_eq!(
            serde_json::to_string(&EventId::from("evt-9")).unwrap_or_default(),
            "\"evt-9\""
        );
    }

    #[test]
    fn detail_decodes_optional_fields() {
        let json = r#"{
            "id": 3, "lat": 35.0, "lng": 139.0, "icon_category": 2,
            "title": "Summer Festival",
            "site_url": "https://example.com",
            "start_date": "2025-08-01",
            "end_date": "2025-08-03T18:00:00+09:00"
        }"#;
        let Ok(detail) = serde_json::from_str::<EventDetail>(json) else {
            panic!("valid detail");
        };
        assert_eq!(detail.title, "Summer Festival");
        assert_eq!(detail.category, None);
        let Some((start, end)) = detail.schedule() else {
            panic!("both dates present");
        };
        assert_eq!(start.to_string(), "2025-08-01");
        assert_eq!(end.to_string(), "2025-08-03");
    }

    #[test]
    fn unparseable_dates_are_absent() {
        let json = r#"{"id": 3, "lat": 0.0, "lng": 0.0, "start_date": "soon", "end_date": null}"#;
        let Ok(detail) = serde_json::from_str::<EventDetail>(json) else {
            panic!("detail with bad date still decodes");
        };
        assert_eq!(detail.start_date, None);
        assert!(detail.schedule().is_none());
    }

    #[test]
    fn detail_projects_to_summary() {
        let json = r#"{"id": "a", "lat": 1.0, "lng": 2.0, "icon_category": 7, "title": "Live"}"#;
        let Ok(detail) = serde_json::from_str::<EventDetail>(json) else {
            panic!("valid detail");
        };
        let summary = detail.summary();
        assert_eq!(summary.id, EventId::from("a"));
        assert_eq!(summary.position(), GeoPoint::new(1.0, 2.0));
        assert_eq!(summary.icon_category, IconCategory::Music);
    }
}
