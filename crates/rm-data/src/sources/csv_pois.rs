//! Point-of-interest catalog backed by a CSV file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, warn};

use rm_core::GeoPoint;

use crate::model::Poi;
use crate::sources::PoiCatalogSource;
use crate::DataError;

/// One catalog row. Header: `id,name,lng,lat`.
#[derive(Debug, Deserialize)]
struct PoiRow {
    id: i64,
    name: String,
    lng: f64,
    lat: f64,
}

/// Loads the POI catalog from a CSV file.
///
/// Rows that fail to parse or carry out-of-range coordinates are skipped,
/// so one bad record never hides the rest of the catalog. I/O failures
/// still fail the whole fetch.
pub struct CsvPoiSource {
    path: PathBuf,
    name: String,
}

impl CsvPoiSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("pois.csv")
            .to_string();
        Self { path, name }
    }

    fn read_file(path: &Path) -> Result<Vec<Poi>, DataError> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(BufReader::new(file));

        let mut pois = Vec::new();
        for result in reader.deserialize::<PoiRow>() {
            let row = match result {
                Ok(row) => row,
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    warn!(%err, "skipping malformed catalog row");
                    continue;
                }
            };
            match GeoPoint::new(row.lng, row.lat) {
                Some(coords) => pois.push(Poi {
                    id: row.id,
                    name: row.name,
                    coords,
                }),
                None => warn!(id = row.id, "skipping catalog row with invalid coordinates"),
            }
        }
        Ok(pois)
    }
}

#[async_trait]
impl PoiCatalogSource for CsvPoiSource {
    async fn fetch_catalog(&self) -> Result<Vec<Poi>, DataError> {
        let path = self.path.clone();
        let pois = tokio::task::spawn_blocking(move || Self::read_file(&path)).await??;
        debug!(source = %self.name, count = pois.len(), "loaded poi catalog");
        Ok(pois)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
