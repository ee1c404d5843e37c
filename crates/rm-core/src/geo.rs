//! Geographic value types
//!
//! Coordinates follow the backend's lng/lat ordering (GeoJSON style).
//! A `GeoPoint` is only constructible through `new` when it is a real
//! position; everything that arrives from outside goes through that gate.

use serde::{Deserialize, Serialize};

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Create a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lng: f64, lat: f64) -> Option<Self> {
        let point = Self { lng, lat };
        point.is_valid().then_some(point)
    }

    /// Whether the coordinates are finite and inside lng ∈ [-180, 180],
    /// lat ∈ [-90, 90].
    pub fn is_valid(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Canonical key used to merge items at the same position.
    ///
    /// Uses the shortest decimal representation of the raw values, so only
    /// bit-equal coordinates share a key; no rounding is applied.
    pub fn key(&self) -> String {
        format!("{}|{}", self.lng, self.lat)
    }
}

/// An axis-aligned geographic rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl GeoBounds {
    /// Build a normalized rectangle from any two corners.
    ///
    /// Surfaces are allowed to report the corners swapped; the result always
    /// has `south_west` at the minimum of each axis.
    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            south_west: GeoPoint {
                lng: a.lng.min(b.lng),
                lat: a.lat.min(b.lat),
            },
            north_east: GeoPoint {
                lng: a.lng.max(b.lng),
                lat: a.lat.max(b.lat),
            },
        }
    }

    /// A degenerate rectangle covering a single point.
    pub fn from_point(point: GeoPoint) -> Self {
        Self {
            south_west: point,
            north_east: point,
        }
    }

    /// Union rectangle of a point sequence, `None` when empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::from_point(first);
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Grow the rectangle to include `point`.
    pub fn extend(&mut self, point: GeoPoint) {
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
    }

    /// Inclusive containment test on both axes.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
            && point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
    }

    /// Midpoint of the rectangle.
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
        }
    }
}

/// The camera state a surface reports after a move: visible rectangle plus
/// zoom level. Recomputed on every move event, never cached by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: GeoBounds,
    pub zoom: f64,
}

impl Viewport {
    /// Build a viewport, normalizing the corners.
    pub fn new(south_west: GeoPoint, north_east: GeoPoint, zoom: f64) -> Self {
        Self {
            bounds: GeoBounds::from_corners(south_west, north_east),
            zoom,
        }
    }
}
