//! Listing source backed by a JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::model::Listing;
use crate::sources::ListingSource;
use crate::DataError;

/// Loads listings from a JSON file holding a bare array of listing records.
///
/// The file is re-read on every fetch; callers that need the data more than
/// once keep their own copy.
pub struct JsonListingSource {
    path: PathBuf,
    name: String,
}

impl JsonListingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("listings.json")
            .to_string();
        Self { path, name }
    }

    async fn read_file(path: &Path) -> Result<Vec<Listing>, DataError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<Vec<Listing>, DataError> {
            let bytes = std::fs::read(&path)?;
            let listings = serde_json::from_slice(&bytes)?;
            Ok(listings)
        })
        .await?
    }
}

#[async_trait]
impl ListingSource for JsonListingSource {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, DataError> {
        let listings = Self::read_file(&self.path).await?;
        debug!(source = %self.name, count = listings.len(), "loaded listings");
        Ok(listings)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
