//! Geographic value types: points and viewport rectangles in WGS-84 degrees.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS-84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// The rectangle currently visible in the map viewport.
///
/// `north >= south` always holds. East and west are taken as given; a
/// viewport crossing the antimeridian has `west > east` and is not
/// unwrapped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportBounds {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl ViewportBounds {
    /// Builds bounds from four edges.
    ///
    /// Returns `None` if any edge is not finite or `north < south`.
    #[must_use]
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Option<Self> {
        let finite = [north, south, east, west].iter().all(|v| v.is_finite());
        if !finite || north < south {
            return None;
        }
        Some(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Builds bounds of the given spans centred on `center`.
    ///
    /// Latitude edges are clamped to ±90.
    #[must_use]
    pub fn around(center: GeoPoint, lat_span: f64, lng_span: f64) -> Option<Self> {
        let half_lat = lat_span.abs() / 2.0;
        let half_lng = lng_span.abs() / 2.0;
        Self::new(
            (center.lat + half_lat).min(90.0),
            (center.lat - half_lat).max(-90.0),
            center.lng + half_lng,
            center.lng - half_lng,
        )
    }

    /// Northern edge.
    #[must_use]
    pub const fn north(&self) -> f64 {
        self.north
    }

    /// Southern edge.
    #[must_use]
    pub const fn south(&self) -> f64 {
        self.south
    }

    /// Eastern edge.
    #[must_use]
    pub const fn east(&self) -> f64 {
        self.east
    }

    /// Western edge.
    #[must_use]
    pub const fn west(&self) -> f64 {
        self.west
    }

    /// Returns the midpoint of the rectangle.
    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// Returns `true` if `point` lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat <= self.north
            && point.lat >= self.south
            && point.lng <= self.east
            && point.lng >= self.west
    }
}

impl fmt::Display for ViewportBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[n={} s={} e={} w={}]",
            self.north, self.south, self.east, self.west
        )
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_latitudes() {
        assert!(ViewportBounds::new(35.0, 36.0, 140.0, 139.0).is_none());
    }

    #[test]
    fn rejects_non_finite_edges() {
        assert!(ViewportBounds::new(f64::NAN, 35.0, 140.0, 139.0).is_none());
        assert!(ViewportBounds::new(36.0, 35.0, f64::INFINITY, 139.0).is_none());
    }

    #[test]
    fn accepts_degenerate_rectangle() {
        let Some(b) = ViewportBounds::new(35.0, 35.0, 139.0, 139.0) else {
            panic!("zero-area bounds are valid");
        };
        assert!(b.contains(GeoPoint::new(35.0, 139.0)));
    }

    #[test]
    fn contains_checks_all_edges() {
        let Some(b) = ViewportBounds::new(36.0, 35.0, 140.0, 139.0) else {
            panic!("valid bounds");
        };
        assert!(b.contains(GeoPoint::new(35.5, 139.5)));
        assert!(!b.contains(GeoPoint::new(36.5, 139.5)));
        assert!(!b.contains(GeoPoint::new(35.5, 140.5)));
        assert!(!b.contains(GeoPoint::new(34.9, 139.5)));
        assert!(!b.contains(GeoPoint::new(35.5, 138.9)));
    }

    #[test]
    fn around_centres_the_rectangle() {
        let Some(b) = ViewportBounds::around(GeoPoint::new(35.0, 139.0), 0.2, 0.4) else {
            panic!("valid bounds");
        };
        assert!((b.north() - 35.1).abs() < 1e-9);
        assert!((b.south() - 34.9).abs() < 1e-9);
        assert!((b.east() - 139.2).abs() < 1e-9);
        assert!((b.west() - 138.8).abs() < 1e-9);
        let c = b.center();
        assert!((c.lat - 35.0).abs() < 1e-9);
        assert!((c.lng - 139.0).abs() < 1e-9);
    }

    #[test]
    fn around_clamps_at_the_poles() {
        let Some(b) = ViewportBounds::around(GeoPoint::new(89.9, 0.0), 1.0, 1.0) else {
            panic!("valid bounds");
        };
        assert!((b.north() - 90.0).abs() < f64::EPSILON);
    }
}
