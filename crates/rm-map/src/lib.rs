//! Interactive map layer for the rental marketplace
//!
//! Three page controllers sit on top of one rendering seam:
//!
//! - [`SearchMap`]: grouped listing markers plus the viewport-culled
//!   university layer on the search page
//! - [`DetailMap`]: one property pin and walking navigation on the detail
//!   page
//! - [`SelectionMap`]: pick-a-point map on the publish form
//!
//! All of them drive a [`MapSurface`], the trait seam over the rendering
//! engine. [`HeadlessSurface`] implements it in memory for tests and the
//! demo binary; a production build would back it with a real tile renderer.

pub mod aggregate;
pub mod detail;
pub mod error;
pub mod markers;
pub mod navigation;
pub mod poi_layer;
pub mod search;
pub mod selection;
pub mod surface;

pub use aggregate::{group_listings, CoordinateAggregator, MarkerGroup};
pub use detail::DetailMap;
pub use error::MapError;
pub use navigation::{
    LocationStream, NavState, NavigationSession, RecordingOverlay, RoutingEvent, RoutingOverlay,
    ScriptedLocationStream,
};
pub use poi_layer::ViewportCuller;
pub use search::SearchMap;
pub use selection::SelectionMap;
pub use surface::{HeadlessSurface, MapSurface, MarkerId, MarkerSpec, MarkerStyle, SubscriptionId};
