//! Routing overlay seam
//!
//! The turn-by-turn overlay draws on the surface itself; the session only
//! feeds it endpoints and reacts to its lifecycle reports.

use parking_lot::Mutex;

use rm_core::GeoPoint;

/// Lifecycle reports from the routing overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingEvent {
    /// A route was computed and drawn
    Route,
    /// The route display was cleared
    Clear,
    /// Route computation failed
    Error(String),
}

/// Seam to the route renderer.
pub trait RoutingOverlay: Send + Sync {
    /// Move the route origin, normally to the user's latest fix.
    fn set_origin(&self, point: GeoPoint);

    /// Point the route at a destination.
    fn set_destination(&self, point: GeoPoint);
}

/// Overlay that records every endpoint update, for tests and the demo.
#[derive(Default)]
pub struct RecordingOverlay {
    origins: Mutex<Vec<GeoPoint>>,
    destinations: Mutex<Vec<GeoPoint>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origins(&self) -> Vec<GeoPoint> {
        self.origins.lock().clone()
    }

    pub fn destinations(&self) -> Vec<GeoPoint> {
        self.destinations.lock().clone()
    }
}

impl RoutingOverlay for RecordingOverlay {
    fn set_origin(&self, point: GeoPoint) {
        self.origins.lock().push(point);
    }

    fn set_destination(&self, point: GeoPoint) {
        self.destinations.lock().push(point);
    }
}
