//! Map surface seam
//!
//! [`MapSurface`] is the boundary to the external rendering engine. The
//! controllers in this crate drive every camera move, marker and popup
//! through it and never talk to the engine directly, so the whole layer can
//! run against [`HeadlessSurface`] in tests and the demo binary.

pub mod headless;

pub use headless::{HeadlessSurface, PlacedMarker, SurfaceOp};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rm_core::{GeoBounds, GeoPoint, Viewport};

/// Handle for a placed marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerId(Uuid);

impl MarkerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for a registered event callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Visual role of a marker.
///
/// The rendering engine maps these to its own elements; the map layer only
/// distinguishes roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarkerStyle {
    /// Listing pin; `badge` carries the group size when several listings
    /// share the position
    HomePin { badge: Option<usize> },

    /// University pin from the POI catalog
    UniversityPin,

    /// The user's live position during navigation
    UserPin,

    /// Draggable pin for the property-registration form
    SelectionPin,
}

/// One listing entry inside a marker popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupEntry {
    pub listing_id: i64,
    pub name: String,

    /// Formatted monthly price, e.g. `$7,200/mes`
    pub price: String,
}

/// Plain-data popup body. Markup is the rendering engine's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupContent {
    pub entries: Vec<PopupEntry>,

    /// Entries beyond the display cap, shown as a "+N más" line
    pub more: usize,
}

/// Everything needed to place one marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub position: GeoPoint,
    pub style: MarkerStyle,

    /// Hover label
    pub title: Option<String>,
    pub popup: Option<PopupContent>,
}

impl MarkerSpec {
    pub fn new(position: GeoPoint, style: MarkerStyle) -> Self {
        Self {
            position,
            style,
            title: None,
            popup: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_popup(mut self, popup: PopupContent) -> Self {
        self.popup = Some(popup);
        self
    }
}

/// Callback invoked when the camera settles after a move.
pub type MoveEndHandler = Box<dyn Fn(Viewport) + Send + Sync>;

/// Callback invoked when the base map is clicked.
pub type ClickHandler = Box<dyn Fn(GeoPoint) + Send + Sync>;

/// Callback invoked when a marker is clicked.
pub type MarkerClickHandler = Box<dyn Fn(MarkerId) + Send + Sync>;

/// Callback invoked when a marker drag finishes, with the final position.
pub type MarkerDragEndHandler = Box<dyn Fn(MarkerId, GeoPoint) + Send + Sync>;

/// Boundary to the rendering engine.
///
/// Implementations perform no aggregation or filtering of their own; they
/// execute camera and marker commands and report user interaction back
/// through the registered callbacks.
pub trait MapSurface: Send + Sync {
    /// Move the camera instantly.
    fn jump_to(&self, center: GeoPoint, zoom: f64);

    /// Animate the camera with a short easing.
    fn ease_to(&self, center: GeoPoint, zoom: f64);

    /// Animate the camera with a long flight.
    fn fly_to(&self, center: GeoPoint, zoom: f64);

    /// Frame a rectangle with pixel padding, never zooming past `max_zoom`.
    fn fit_bounds(&self, bounds: GeoBounds, padding: f64, max_zoom: f64);

    /// Current camera state.
    fn viewport(&self) -> Viewport;

    fn place_marker(&self, spec: MarkerSpec) -> MarkerId;
    fn move_marker(&self, id: MarkerId, position: GeoPoint);
    fn remove_marker(&self, id: MarkerId);

    /// Open the marker's popup if closed, close it if open.
    fn toggle_popup(&self, id: MarkerId);

    fn on_move_end(&self, handler: MoveEndHandler) -> SubscriptionId;
    fn on_click(&self, handler: ClickHandler) -> SubscriptionId;
    fn on_marker_click(&self, handler: MarkerClickHandler) -> SubscriptionId;
    fn on_marker_drag_end(&self, handler: MarkerDragEndHandler) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}
