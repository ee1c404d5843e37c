//! Map layer errors

use rm_data::DataError;
use thiserror::Error;

/// Failures surfaced by the map controllers.
///
/// Data-quality problems (missing or malformed coordinates) never appear
/// here; those are dropped at the aggregation boundary. These variants are
/// the failures a user's requested action cannot survive.
#[derive(Debug, Error)]
pub enum MapError {
    /// Location access denied by the user or the platform
    #[error("location permission denied")]
    PermissionDenied,

    /// The device cannot provide a location stream at all
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// The external overlay could not compute a route
    #[error("routing failed: {0}")]
    RoutingFailed(String),

    /// Operation on a controller after teardown
    #[error("map surface already disposed")]
    SurfaceDisposed,

    /// Failure in a backing data source
    #[error(transparent)]
    Data(#[from] DataError),
}
