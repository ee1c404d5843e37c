//! Core primitives for the rentmap platform
//!
//! This crate provides the geographic value types, settings and event
//! plumbing shared by the map layer and its host application.

pub mod events;
pub mod geo;
pub mod notice;
pub mod settings;

// Re-export commonly used types
pub use events::{EventBus, MapEvent, MapEventSubscriber};
pub use geo::{GeoBounds, GeoPoint, Viewport};
pub use notice::{Notice, Severity};
pub use settings::MapSettings;
