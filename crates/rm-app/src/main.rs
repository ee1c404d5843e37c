//! Demo runner for the map layer
//!
//! Drives the three page controllers against in-memory surfaces with the
//! bundled fixture data, logging every bus event. An optional first
//! argument points at a settings JSON file to run with overridden tunables.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use rm_core::{EventBus, GeoPoint, MapEvent, MapEventSubscriber, MapSettings, Viewport};
use rm_data::{CsvPoiSource, JsonListingSource, StaticGeocoder};
use rm_map::{
    DetailMap, HeadlessSurface, MapSurface, MarkerStyle, RecordingOverlay, RoutingEvent,
    ScriptedLocationStream, SearchMap, SelectionMap,
};

/// Logs every bus event, standing in for the host application.
struct EventLogger;

impl MapEventSubscriber for EventLogger {
    fn on_map_event(&self, event: &MapEvent) {
        match event {
            MapEvent::ListingsRendered { groups, listings } => {
                info!(groups, listings, "listings rendered");
            }
            MapEvent::PoiLayerRendered { visible } => {
                info!(visible, "university layer rendered");
            }
            MapEvent::ListingActivated { listing_id } => {
                info!(listing_id, "listing activated");
            }
            MapEvent::CoordinatesChanged { point } => {
                info!(lng = point.lng, lat = point.lat, "coordinates chosen");
            }
            MapEvent::NoticeRaised(notice) => {
                info!(severity = ?notice.severity, message = %notice.message, "notice");
            }
        }
    }
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn load_settings() -> Result<MapSettings> {
    match env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings from {path}"))?;
            MapSettings::from_json_str(&json)
        }
        None => Ok(MapSettings::default()),
    }
}

async fn run_search_page(settings: &MapSettings) -> Result<()> {
    info!("search page: grouped listings and the university layer");

    let surface = HeadlessSurface::centered(
        settings.camera.default_center,
        settings.camera.search_zoom,
    );
    let bus = Arc::new(EventBus::new());
    let logger = Arc::new(EventLogger);
    bus.subscribe(logger.clone());

    let map = SearchMap::new(surface.clone(), bus, settings.clone());
    let listings = JsonListingSource::new(fixture("listings.json"));
    let catalog = CsvPoiSource::new(fixture("universities.csv"));
    map.load(&listings, &catalog).await?;

    for group in map.groups() {
        info!(
            key = %group.key,
            listings = group.listings.len(),
            "marker group"
        );
    }

    // Pan south-west and let the debounce window elapse.
    let current = surface.viewport();
    let shifted = Viewport::new(
        GeoPoint {
            lng: current.bounds.south_west.lng - 0.05,
            lat: current.bounds.south_west.lat - 0.05,
        },
        GeoPoint {
            lng: current.bounds.north_east.lng - 0.05,
            lat: current.bounds.north_east.lat - 0.05,
        },
        current.zoom,
    );
    surface.emit_move_end(shifted);
    tokio::time::sleep(Duration::from_millis(250)).await;
    info!(visible = map.poi_count(), "university layer after panning");

    map.teardown();
    Ok(())
}

async fn run_selection_page(settings: &MapSettings) -> Result<()> {
    info!("selection page: click, drag, and address search");

    let surface = HeadlessSurface::centered(
        settings.camera.default_center,
        settings.camera.fallback_zoom,
    );
    let bus = Arc::new(EventBus::new());
    let logger = Arc::new(EventLogger);
    bus.subscribe(logger.clone());

    let geocoder = Arc::new(StaticGeocoder::new(vec![
        (
            "Ciudad Universitaria".to_string(),
            GeoPoint {
                lng: -99.1871,
                lat: 19.3324,
            },
        ),
        (
            "Santa Fe".to_string(),
            GeoPoint {
                lng: -99.2591,
                lat: 19.3594,
            },
        ),
    ]));
    let map = SelectionMap::new(surface.clone(), bus, geocoder, settings.clone(), None);

    surface.emit_click(GeoPoint {
        lng: -99.155,
        lat: 19.410,
    });
    if let Some(point) = map.search("ciudad universitaria").await? {
        info!(lng = point.lng, lat = point.lat, "address search hit");
    }
    if let Some((pin, _)) = surface
        .markers_with_style(&MarkerStyle::SelectionPin)
        .into_iter()
        .next()
    {
        surface.emit_marker_drag_end(
            pin,
            GeoPoint {
                lng: -99.1880,
                lat: 19.3340,
            },
        );
    }
    info!(coordinates = ?map.coordinates(), "final selection");

    map.teardown();
    Ok(())
}

fn run_detail_page(settings: &MapSettings) -> Result<()> {
    info!("detail page: walking navigation toward a property");

    let destination = GeoPoint {
        lng: -99.1560,
        lat: 19.4210,
    };
    let surface = HeadlessSurface::centered(destination, settings.camera.located_zoom);
    let overlay = Arc::new(RecordingOverlay::new());
    let stream = Arc::new(ScriptedLocationStream::new());
    let bus = Arc::new(EventBus::new());
    let logger = Arc::new(EventLogger);
    bus.subscribe(logger.clone());

    let map = DetailMap::new(
        surface,
        overlay.clone(),
        stream.clone(),
        bus,
        settings.clone(),
        Some(destination),
    );
    map.start_navigation()?;
    map.on_routing_event(&RoutingEvent::Route);

    // Walk the user three fixes closer to the property.
    let steps = [
        GeoPoint {
            lng: -99.1700,
            lat: 19.4100,
        },
        GeoPoint {
            lng: -99.1650,
            lat: 19.4140,
        },
        GeoPoint {
            lng: -99.1600,
            lat: 19.4180,
        },
    ];
    for step in steps {
        stream.push(step);
        info!(
            state = ?map.navigation_state(),
            lng = step.lng,
            lat = step.lat,
            "fix processed"
        );
    }

    map.stop_navigation();
    info!(
        origin_updates = overlay.origins().len(),
        "route fed while walking"
    );
    map.teardown();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = load_settings()?;
    info!(
        lng = settings.camera.default_center.lng,
        lat = settings.camera.default_center.lat,
        "map settings loaded"
    );

    run_search_page(&settings).await?;
    run_selection_page(&settings).await?;
    run_detail_page(&settings)?;

    Ok(())
}
