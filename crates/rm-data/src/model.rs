//! Listing and POI data model
//!
//! These mirror what the backend sends. Coordinates arrive in a
//! GeoJSON-flavored nested array that is frequently absent or malformed in
//! production data; `RawLocation::point` is the single place that turns the
//! wire shape into a validated [`GeoPoint`].

use serde::{Deserialize, Serialize};

use rm_core::geo::GeoPoint;

/// Backend wire shape for a listing's location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocation {
    /// Street address as entered by the landlord
    #[serde(default)]
    pub address: Option<String>,

    /// Neighborhood / colonia
    #[serde(default)]
    pub district: Option<String>,

    #[serde(default)]
    pub municipality: Option<String>,

    /// `[lng, lat]`; shorter arrays and non-finite values yield no point
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl RawLocation {
    /// Validated coordinate, or `None` when the wire data is unusable.
    pub fn point(&self) -> Option<GeoPoint> {
        match self.coordinates.as_slice() {
            [lng, lat, ..] => GeoPoint::new(*lng, *lat),
            _ => None,
        }
    }
}

/// A rentable property as listed in the marketplace.
///
/// The map layer never mutates listings; it only reads the fields needed to
/// place and describe a marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub name: String,

    /// Monthly price
    pub price: f64,

    #[serde(default)]
    pub location: Option<RawLocation>,
}

impl Listing {
    /// Validated coordinate for marker placement, if any.
    pub fn position(&self) -> Option<GeoPoint> {
        self.location.as_ref().and_then(RawLocation::point)
    }
}

/// A university layered on top of the listing markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: i64,
    pub name: String,
    pub coords: GeoPoint,
}

/// Criteria for the backend's filtered listing query.
///
/// Fixture sources apply it in memory; the real source serializes it into
/// query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingFilter {
    #[serde(default)]
    pub price_min: Option<f64>,

    #[serde(default)]
    pub price_max: Option<f64>,

    #[serde(default)]
    pub district: Option<String>,

    #[serde(default)]
    pub municipality: Option<String>,

    /// Proximity to a university. Resolved by the backend's geography;
    /// in-memory sources cannot apply it.
    #[serde(default)]
    pub university_id: Option<i64>,
}

impl ListingFilter {
    /// Whether a listing satisfies every locally checkable criterion.
    /// `university_id` passes through untested.
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(min) = self.price_min {
            if listing.price < min {
                return false;
            }
        }
        if let Some(max) = self.price_max {
            if listing.price > max {
                return false;
            }
        }
        if let Some(district) = &self.district {
            let found = listing
                .location
                .as_ref()
                .and_then(|loc| loc.district.as_deref())
                .map(|d| d.eq_ignore_ascii_case(district))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }
        if let Some(municipality) = &self.municipality {
            let found = listing
                .location
                .as_ref()
                .and_then(|loc| loc.municipality.as_deref())
                .map(|m| m.eq_ignore_ascii_case(municipality))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: i64, price: f64, district: &str) -> Listing {
        Listing {
            id,
            name: format!("Depto {id}"),
            price,
            location: Some(RawLocation {
                district: Some(district.to_string()),
                coordinates: vec![-99.1, 19.4],
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_raw_location_rejects_malformed_coordinates() {
        let empty = RawLocation::default();
        assert!(empty.point().is_none());

        let short = RawLocation {
            coordinates: vec![-99.1],
            ..Default::default()
        };
        assert!(short.point().is_none());

        let nan = RawLocation {
            coordinates: vec![f64::NAN, 19.4],
            ..Default::default()
        };
        assert!(nan.point().is_none());

        let out_of_range = RawLocation {
            coordinates: vec![-190.0, 19.4],
            ..Default::default()
        };
        assert!(out_of_range.point().is_none());
    }

    #[test]
    fn test_raw_location_accepts_extra_dimensions() {
        // Some backends append altitude; it is ignored
        let loc = RawLocation {
            coordinates: vec![-99.1, 19.4, 2240.0],
            ..Default::default()
        };
        assert_eq!(loc.point(), GeoPoint::new(-99.1, 19.4));
    }

    #[test]
    fn test_filter_price_bounds() {
        let filter = ListingFilter {
            price_min: Some(4000.0),
            price_max: Some(8000.0),
            ..Default::default()
        };
        assert!(filter.matches(&listing(1, 5000.0, "Centro")));
        assert!(!filter.matches(&listing(2, 3999.0, "Centro")));
        assert!(!filter.matches(&listing(3, 8001.0, "Centro")));
    }

    #[test]
    fn test_filter_district_is_case_insensitive() {
        let filter = ListingFilter {
            district: Some("centro".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&listing(1, 5000.0, "Centro")));
        assert!(!filter.matches(&listing(2, 5000.0, "Del Valle")));
    }

    #[test]
    fn test_filter_university_id_is_not_applied_locally() {
        let filter = ListingFilter {
            university_id: Some(3),
            ..Default::default()
        };
        assert!(filter.matches(&listing(1, 5000.0, "Centro")));
    }

    #[test]
    fn test_filter_district_missing_location_fails() {
        let filter = ListingFilter {
            district: Some("Centro".to_string()),
            ..Default::default()
        };
        let no_location = Listing {
            id: 9,
            name: "Sin ubicación".to_string(),
            price: 5000.0,
            location: None,
        };
        assert!(!filter.matches(&no_location));
    }

    #[test]
    fn test_listing_deserializes_without_location() {
        let json = r#"{ "id": 4, "name": "Cuarto centro", "price": 3500.0 }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert!(listing.location.is_none());
        assert!(listing.position().is_none());
    }
}
