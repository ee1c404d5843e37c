//! Map layer settings
//!
//! Every tunable the map layer consumes lives here so tests and hosts can
//! override them without touching component internals. Defaults are the
//! production values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Top-level settings bundle handed to every controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSettings {
    /// Camera defaults and fit behavior
    pub camera: CameraSettings,

    /// POI layer culling behavior
    pub poi: PoiSettings,

    /// Popup composition behavior
    pub popup: PopupSettings,

    /// Marker-click easing behavior
    pub click_zoom: ClickZoomSettings,
}

/// Camera defaults and fit behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Fallback center when no coordinates are supplied
    pub default_center: GeoPoint,

    /// Initial zoom for the search map
    pub search_zoom: f64,

    /// Zoom used when a single known coordinate is framed
    pub located_zoom: f64,

    /// Zoom used when the selection marker is placed from a known coordinate
    pub selection_zoom: f64,

    /// Zoom used when no coordinate is known yet
    pub fallback_zoom: f64,

    /// Pixel padding for fit-bounds requests
    pub fit_padding: f64,

    /// Zoom ceiling when fitting the listing bounds
    pub fit_max_zoom: f64,

    /// Zoom ceiling when re-framing a live navigation session
    pub nav_fit_max_zoom: f64,
}

/// POI layer culling behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiSettings {
    /// Below this zoom the POI layer renders nothing
    pub min_zoom: f64,

    /// Quiet period that must elapse after the last move event
    pub debounce_ms: u64,
}

impl PoiSettings {
    /// Debounce window as a `Duration`.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Popup composition behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupSettings {
    /// Entries shown before collapsing into an overflow count
    pub max_entries: usize,
}

/// Marker-click easing behavior.
///
/// Groups with several listings zoom in further than single-listing pins so
/// overlapping positions disambiguate. The deltas and floors are tunable;
/// only the ordering between the two cases is relied upon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickZoomSettings {
    pub single_delta: f64,
    pub single_floor: f64,
    pub multi_delta: f64,
    pub multi_floor: f64,
    pub ceiling: f64,
}

impl ClickZoomSettings {
    /// Target zoom for a click on a group at the current zoom level.
    pub fn target(&self, current_zoom: f64, multi: bool) -> f64 {
        let raised = if multi {
            (current_zoom + self.multi_delta).max(self.multi_floor)
        } else {
            (current_zoom + self.single_delta).max(self.single_floor)
        };
        raised.min(self.ceiling)
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            camera: CameraSettings {
                default_center: GeoPoint {
                    lng: -99.1332,
                    lat: 19.4326,
                },
                search_zoom: 11.0,
                located_zoom: 15.0,
                selection_zoom: 16.0,
                fallback_zoom: 12.0,
                fit_padding: 60.0,
                fit_max_zoom: 15.0,
                nav_fit_max_zoom: 16.0,
            },
            poi: PoiSettings {
                min_zoom: 9.0,
                debounce_ms: 200,
            },
            popup: PopupSettings { max_entries: 8 },
            click_zoom: ClickZoomSettings {
                single_delta: 1.0,
                single_floor: 13.0,
                multi_delta: 2.0,
                multi_floor: 14.0,
                ceiling: 18.0,
            },
        }
    }
}

impl MapSettings {
    /// Parse settings from a JSON document (host override files).
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_zoom_orders_multi_above_single() {
        let settings = MapSettings::default().click_zoom;
        for zoom in [5.0, 11.0, 13.5, 16.0] {
            assert!(settings.target(zoom, true) >= settings.target(zoom, false));
        }
    }

    #[test]
    fn test_click_zoom_clamped_to_ceiling() {
        let settings = MapSettings::default().click_zoom;
        assert_eq!(settings.target(17.5, true), settings.ceiling);
        assert_eq!(settings.target(17.5, false), settings.ceiling);
        // Already at the ceiling: never zooms past it
        assert_eq!(settings.target(18.0, true), 18.0);
    }

    #[test]
    fn test_click_zoom_floors_apply_at_low_zoom() {
        let settings = MapSettings::default().click_zoom;
        assert_eq!(settings.target(5.0, false), settings.single_floor);
        assert_eq!(settings.target(5.0, true), settings.multi_floor);
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = MapSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed = MapSettings::from_json_str(&json).unwrap();
        assert_eq!(parsed.poi.debounce_ms, settings.poi.debounce_ms);
        assert_eq!(parsed.camera.default_center, settings.camera.default_center);
    }

    #[test]
    fn test_debounce_duration() {
        let poi = MapSettings::default().poi;
        assert_eq!(poi.debounce(), Duration::from_millis(200));
    }
}
