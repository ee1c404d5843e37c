//! In-memory sources, used by tests and the demo binary.

use async_trait::async_trait;

use rm_core::GeoPoint;

use crate::model::{Listing, Poi};
use crate::sources::{Geocoder, ListingSource, PoiCatalogSource};
use crate::DataError;

/// Listing source that serves a fixed set.
pub struct StaticListingSource {
    listings: Vec<Listing>,
}

impl StaticListingSource {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }
}

#[async_trait]
impl ListingSource for StaticListingSource {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, DataError> {
        Ok(self.listings.clone())
    }

    fn source_name(&self) -> &str {
        "static-listings"
    }
}

/// Catalog source that serves a fixed set.
pub struct StaticPoiSource {
    pois: Vec<Poi>,
}

impl StaticPoiSource {
    pub fn new(pois: Vec<Poi>) -> Self {
        Self { pois }
    }
}

#[async_trait]
impl PoiCatalogSource for StaticPoiSource {
    async fn fetch_catalog(&self) -> Result<Vec<Poi>, DataError> {
        Ok(self.pois.clone())
    }

    fn source_name(&self) -> &str {
        "static-catalog"
    }
}

/// Geocoder that matches queries against a fixed place list.
///
/// Matching is a case-insensitive substring check on the place name; the
/// first hit in insertion order wins.
pub struct StaticGeocoder {
    places: Vec<(String, GeoPoint)>,
}

impl StaticGeocoder {
    pub fn new(places: Vec<(String, GeoPoint)>) -> Self {
        Self { places }
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, DataError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }
        let hit = self
            .places
            .iter()
            .find(|(name, _)| name.to_lowercase().contains(&needle))
            .map(|(_, point)| *point);
        Ok(hit)
    }
}
