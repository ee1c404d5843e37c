//! Data sources for listings, the point-of-interest catalog, and geocoding.
//!
//! Everything the map layer consumes arrives through one of the three traits
//! here, so hosts can swap fixture files for live transports without touching
//! the controllers.

pub mod csv_pois;
pub mod json_listings;
pub mod memory;

pub use csv_pois::CsvPoiSource;
pub use json_listings::JsonListingSource;
pub use memory::{StaticGeocoder, StaticListingSource, StaticPoiSource};

use async_trait::async_trait;

use rm_core::GeoPoint;

use crate::model::{Listing, ListingFilter, Poi};
use crate::DataError;

/// Source of rental listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch every listing the source knows about.
    async fn fetch_listings(&self) -> Result<Vec<Listing>, DataError>;

    /// Fetch only the listings matching `filter`.
    async fn fetch_filtered(&self, filter: &ListingFilter) -> Result<Vec<Listing>, DataError> {
        let listings = self.fetch_listings().await?;
        Ok(listings.into_iter().filter(|l| filter.matches(l)).collect())
    }

    /// Short name for log lines.
    fn source_name(&self) -> &str;
}

/// Source of the point-of-interest catalog shown alongside listings.
///
/// The catalog is expected to be small and stable; callers fetch it once and
/// cache the result for the lifetime of the map.
#[async_trait]
pub trait PoiCatalogSource: Send + Sync {
    /// Fetch the full catalog.
    async fn fetch_catalog(&self) -> Result<Vec<Poi>, DataError>;

    /// Short name for log lines.
    fn source_name(&self) -> &str;
}

/// Forward geocoder: resolves free-text queries to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `query` to a point, or `None` when nothing matches.
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, DataError>;
}
