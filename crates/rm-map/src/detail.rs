//! Property detail map
//!
//! The map on a single property's page: one pin on the property, and
//! walking navigation toward it on demand. Listings without coordinates
//! still get a map, centered on the city fallback view with no pin.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use rm_core::{EventBus, GeoPoint, MapSettings};

use crate::error::MapError;
use crate::navigation::{LocationStream, NavState, NavigationSession, RoutingEvent, RoutingOverlay};
use crate::surface::{MapSurface, MarkerId, MarkerSpec, MarkerStyle};

struct DetailState {
    coords: Option<GeoPoint>,
    property_marker: Option<MarkerId>,
    session: Option<Arc<NavigationSession>>,
}

pub struct DetailMap {
    surface: Arc<dyn MapSurface>,
    overlay: Arc<dyn RoutingOverlay>,
    stream: Arc<dyn LocationStream>,
    bus: Arc<EventBus>,
    settings: MapSettings,
    state: Mutex<DetailState>,
    disposed: AtomicBool,
}

impl DetailMap {
    pub fn new(
        surface: Arc<dyn MapSurface>,
        overlay: Arc<dyn RoutingOverlay>,
        stream: Arc<dyn LocationStream>,
        bus: Arc<EventBus>,
        settings: MapSettings,
        coords: Option<GeoPoint>,
    ) -> Self {
        match coords {
            Some(point) => surface.jump_to(point, settings.camera.located_zoom),
            None => {
                warn!("property has no coordinates, showing fallback view");
                surface.jump_to(settings.camera.default_center, settings.camera.fallback_zoom);
            }
        }

        let map = Self {
            surface,
            overlay,
            stream,
            bus,
            settings,
            state: Mutex::new(DetailState {
                coords,
                property_marker: None,
                session: None,
            }),
            disposed: AtomicBool::new(false),
        };
        if let Some(point) = coords {
            map.place_property_marker(point);
        }
        map
    }

    fn place_property_marker(&self, point: GeoPoint) {
        let mut state = self.state.lock();
        if let Some(id) = state.property_marker.take() {
            self.surface.remove_marker(id);
        }
        let id = self
            .surface
            .place_marker(MarkerSpec::new(point, MarkerStyle::HomePin { badge: None }));
        state.property_marker = Some(id);
    }

    /// Switch the page to another property, or to one without coordinates.
    ///
    /// A running navigation session points at the old destination, so it is
    /// ended first.
    pub fn set_property(&self, coords: Option<GeoPoint>) -> Result<(), MapError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(MapError::SurfaceDisposed);
        }
        let session = self.state.lock().session.take();
        if let Some(session) = session {
            session.stop();
        }

        match coords {
            Some(point) => {
                self.state.lock().coords = Some(point);
                self.place_property_marker(point);
                self.surface.fly_to(point, self.settings.camera.located_zoom);
            }
            None => {
                warn!("property has no coordinates, removing pin");
                let mut state = self.state.lock();
                state.coords = None;
                if let Some(id) = state.property_marker.take() {
                    self.surface.remove_marker(id);
                }
            }
        }
        Ok(())
    }

    /// Start walking navigation toward the property.
    ///
    /// Does nothing when the property has no coordinates. An existing
    /// session is reused: starting is idempotent while it is live, and a
    /// stopped or failed one starts over.
    pub fn start_navigation(&self) -> Result<(), MapError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(MapError::SurfaceDisposed);
        }
        let mut state = self.state.lock();
        let Some(destination) = state.coords else {
            warn!("cannot navigate to a property without coordinates");
            return Ok(());
        };
        if let Some(session) = &state.session {
            let session = session.clone();
            drop(state);
            return session.start();
        }

        let session = NavigationSession::new(
            self.surface.clone(),
            self.overlay.clone(),
            self.stream.clone(),
            self.bus.clone(),
            self.settings.camera.clone(),
            destination,
        );
        state.session = Some(session.clone());
        drop(state);
        session.start()
    }

    /// End navigation, keeping the session around for a later restart.
    pub fn stop_navigation(&self) {
        let session = self.state.lock().session.clone();
        if let Some(session) = session {
            session.stop();
        }
    }

    /// Forward an overlay lifecycle report to the session.
    pub fn on_routing_event(&self, event: &RoutingEvent) {
        let session = self.state.lock().session.clone();
        if let Some(session) = session {
            session.on_routing_event(event);
        }
    }

    pub fn navigation_state(&self) -> Option<NavState> {
        self.state.lock().session.as_ref().map(|s| s.state())
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.state.lock().coords
    }

    pub fn teardown(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let (session, marker) = {
            let mut state = self.state.lock();
            (state.session.take(), state.property_marker.take())
        };
        if let Some(session) = session {
            session.stop();
        }
        if let Some(id) = marker {
            self.surface.remove_marker(id);
        }
        info!("detail map torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{RecordingOverlay, ScriptedLocationStream};
    use crate::surface::{HeadlessSurface, SurfaceOp};
    use rm_core::{MapEvent, MapEventSubscriber, Notice};

    struct Recorder {
        seen: Mutex<Vec<MapEvent>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }

        fn notices(&self) -> Vec<Notice> {
            self.seen
                .lock()
                .iter()
                .filter_map(|event| match event {
                    MapEvent::NoticeRaised(notice) => Some(notice.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl MapEventSubscriber for Recorder {
        fn on_map_event(&self, event: &MapEvent) {
            self.seen.lock().push(event.clone());
        }
    }

    fn point(lng: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lng, lat).unwrap()
    }

    fn property() -> GeoPoint {
        point(-99.16, 19.43)
    }

    struct Harness {
        surface: Arc<HeadlessSurface>,
        overlay: Arc<RecordingOverlay>,
        stream: Arc<ScriptedLocationStream>,
        recorder: Arc<Recorder>,
        map: DetailMap,
    }

    fn harness(coords: Option<GeoPoint>) -> Harness {
        let surface = HeadlessSurface::centered(point(0.0, 0.0), 1.0);
        let overlay = Arc::new(RecordingOverlay::new());
        let stream = Arc::new(ScriptedLocationStream::new());
        let bus = Arc::new(EventBus::new());
        let recorder = Recorder::new();
        bus.subscribe(recorder.clone());
        let map = DetailMap::new(
            surface.clone(),
            overlay.clone(),
            stream.clone(),
            bus,
            MapSettings::default(),
            coords,
        );
        Harness {
            surface,
            overlay,
            stream,
            recorder,
            map,
        }
    }

    #[test]
    fn test_new_with_coordinates_centers_and_pins() {
        let h = harness(Some(property()));

        assert_eq!(
            h.surface.ops()[0],
            SurfaceOp::JumpTo {
                center: property(),
                zoom: 15.0
            }
        );
        let pins = h.surface.markers_with_style(&MarkerStyle::HomePin { badge: None });
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].1.position, property());
    }

    #[test]
    fn test_new_without_coordinates_shows_fallback_view() {
        let h = harness(None);

        assert_eq!(
            h.surface.ops()[0],
            SurfaceOp::JumpTo {
                center: point(-99.1332, 19.4326),
                zoom: 12.0
            }
        );
        assert_eq!(h.surface.marker_count(), 0);
    }

    #[test]
    fn test_set_property_replaces_pin_and_flies() {
        let h = harness(Some(property()));
        let other = point(-99.20, 19.38);
        h.surface.take_ops();

        h.map.set_property(Some(other)).unwrap();

        assert_eq!(h.surface.marker_count(), 1);
        let pins = h.surface.markers_with_style(&MarkerStyle::HomePin { badge: None });
        assert_eq!(pins[0].1.position, other);
        assert!(h.surface.ops().contains(&SurfaceOp::FlyTo {
            center: other,
            zoom: 15.0
        }));
        assert_eq!(h.map.coordinates(), Some(other));
    }

    #[test]
    fn test_set_property_none_removes_pin() {
        let h = harness(Some(property()));

        h.map.set_property(None).unwrap();

        assert_eq!(h.surface.marker_count(), 0);
        assert_eq!(h.map.coordinates(), None);
    }

    #[test]
    fn test_navigation_without_coordinates_is_refused_quietly() {
        let h = harness(None);

        h.map.start_navigation().unwrap();

        assert_eq!(h.map.navigation_state(), None);
        assert_eq!(h.stream.active_watches(), 0);
    }

    #[test]
    fn test_navigation_tracks_toward_property() {
        let h = harness(Some(property()));
        h.map.start_navigation().unwrap();

        let fix = point(-99.17, 19.42);
        h.stream.push(fix);

        assert_eq!(h.map.navigation_state(), Some(NavState::Tracking));
        assert_eq!(h.overlay.destinations(), vec![property()]);
        assert_eq!(h.overlay.origins(), vec![fix]);
        assert_eq!(h.surface.markers_with_style(&MarkerStyle::UserPin).len(), 1);
        // Property pin plus user pin.
        assert_eq!(h.surface.marker_count(), 2);
    }

    #[test]
    fn test_second_start_reuses_live_session() {
        let h = harness(Some(property()));

        h.map.start_navigation().unwrap();
        h.map.start_navigation().unwrap();

        assert_eq!(h.stream.active_watches(), 1);
        assert_eq!(h.overlay.destinations().len(), 1);
    }

    #[test]
    fn test_stopped_navigation_can_restart() {
        let h = harness(Some(property()));
        h.map.start_navigation().unwrap();
        h.stream.push(point(-99.17, 19.42));
        h.map.stop_navigation();
        assert_eq!(h.stream.active_watches(), 0);

        h.map.start_navigation().unwrap();

        assert_eq!(h.map.navigation_state(), Some(NavState::RequestingLocation));
        assert_eq!(h.stream.active_watches(), 1);
        assert_eq!(h.overlay.destinations(), vec![property(), property()]);
    }

    #[test]
    fn test_set_property_ends_running_session() {
        let h = harness(Some(property()));
        h.map.start_navigation().unwrap();
        h.stream.push(point(-99.17, 19.42));
        let other = point(-99.20, 19.38);

        h.map.set_property(Some(other)).unwrap();

        assert_eq!(h.map.navigation_state(), None);
        assert_eq!(h.stream.active_watches(), 0);
        assert!(h.surface.markers_with_style(&MarkerStyle::UserPin).is_empty());

        h.map.start_navigation().unwrap();
        assert_eq!(
            h.overlay.destinations(),
            vec![property(), other]
        );
    }

    #[test]
    fn test_routing_error_is_forwarded_to_session() {
        let h = harness(Some(property()));
        h.map.start_navigation().unwrap();
        h.stream.push(point(-99.17, 19.42));

        h.map
            .on_routing_event(&RoutingEvent::Error("no path".to_string()));

        assert_eq!(h.map.navigation_state(), Some(NavState::Failed));
        assert_eq!(h.recorder.notices()[0].message, "No se pudo calcular la ruta.");
    }

    #[test]
    fn test_teardown_stops_session_and_clears_pin() {
        let h = harness(Some(property()));
        h.map.start_navigation().unwrap();
        h.stream.push(point(-99.17, 19.42));

        h.map.teardown();

        assert_eq!(h.stream.active_watches(), 0);
        assert_eq!(h.surface.marker_count(), 0);
        assert!(matches!(
            h.map.start_navigation(),
            Err(MapError::SurfaceDisposed)
        ));
    }
}
