//! Data contracts and fixture sources for the rentmap platform
//!
//! The REST backend, the geocoding endpoint and their transports are
//! external collaborators; this crate defines the shapes the map layer
//! consumes and file/in-memory implementations used by tests and the demo.

pub mod model;
pub mod sources;

use thiserror::Error;
use tokio::task::JoinError;

// Re-exports
pub use model::{Listing, ListingFilter, Poi, RawLocation};
pub use sources::{
    CsvPoiSource, Geocoder, JsonListingSource, ListingSource, PoiCatalogSource, StaticGeocoder,
    StaticListingSource, StaticPoiSource,
};

/// Errors that can occur fetching or decoding collaborator data.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("join error: {0}")]
    Join(#[from] JoinError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => {
                DataError::Io(std::io::Error::new(io_err.kind(), error.to_string()))
            }
            _ => DataError::Csv(error.to_string()),
        }
    }
}
