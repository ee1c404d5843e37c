//! Walking navigation
//!
//! Seams for the platform location stream and the routing overlay, and the
//! session state machine that ties them to the surface.

mod location;
mod routing;
mod session;

pub use location::{
    LocationErrorHandler, LocationStream, LocationUpdateHandler, ScriptedLocationStream,
    WatchHandle,
};
pub use routing::{RecordingOverlay, RoutingEvent, RoutingOverlay};
pub use session::{NavState, NavigationSession};
