//! Coordinate selection map
//!
//! Used by the publish-a-listing form: the user pins where the property is
//! by clicking the map, dragging the pin, or searching an address. User
//! gestures announce the chosen point on the bus; programmatic placement
//! stays silent so a form feeding coordinates back in does not loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use rm_core::{EventBus, GeoPoint, MapEvent, MapSettings, Notice};
use rm_data::Geocoder;

use crate::error::MapError;
use crate::surface::{MapSurface, MarkerId, MarkerSpec, MarkerStyle, SubscriptionId};

struct SelectionState {
    marker: Option<MarkerId>,
    coords: Option<GeoPoint>,
}

pub struct SelectionMap {
    surface: Arc<dyn MapSurface>,
    bus: Arc<EventBus>,
    geocoder: Arc<dyn Geocoder>,
    settings: MapSettings,
    state: Mutex<SelectionState>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    disposed: AtomicBool,
}

impl SelectionMap {
    /// Build the controller, optionally pre-placing the pin.
    ///
    /// A pre-placed pin is not announced; the host already knows those
    /// coordinates.
    pub fn new(
        surface: Arc<dyn MapSurface>,
        bus: Arc<EventBus>,
        geocoder: Arc<dyn Geocoder>,
        settings: MapSettings,
        initial: Option<GeoPoint>,
    ) -> Arc<Self> {
        match initial {
            Some(point) => surface.jump_to(point, settings.camera.selection_zoom),
            None => surface.jump_to(settings.camera.default_center, settings.camera.fallback_zoom),
        }

        let map = Arc::new(Self {
            surface,
            bus,
            geocoder,
            settings,
            state: Mutex::new(SelectionState {
                marker: None,
                coords: None,
            }),
            subscriptions: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        });
        if let Some(point) = initial {
            map.put_marker(point);
        }

        let weak = Arc::downgrade(&map);
        let click = map.surface.on_click(Box::new(move |point| {
            if let Some(map) = weak.upgrade() {
                map.place_from_click(point);
            }
        }));
        let weak = Arc::downgrade(&map);
        let drag = map.surface.on_marker_drag_end(Box::new(move |id, point| {
            if let Some(map) = weak.upgrade() {
                map.on_drag_end(id, point);
            }
        }));
        map.subscriptions.lock().extend([click, drag]);
        map
    }

    // The pin is created once and moved afterwards, so an in-progress drag
    // never races a replacement.
    fn put_marker(&self, point: GeoPoint) {
        let mut state = self.state.lock();
        state.coords = Some(point);
        match state.marker {
            Some(id) => self.surface.move_marker(id, point),
            None => {
                let id = self
                    .surface
                    .place_marker(MarkerSpec::new(point, MarkerStyle::SelectionPin));
                state.marker = Some(id);
            }
        }
    }

    fn place_from_click(&self, point: GeoPoint) {
        self.put_marker(point);
        debug!(?point, "selection placed by click");
        self.bus.publish(MapEvent::CoordinatesChanged { point });
    }

    fn on_drag_end(&self, id: MarkerId, point: GeoPoint) {
        {
            let mut state = self.state.lock();
            if state.marker != Some(id) {
                return;
            }
            state.coords = Some(point);
        }
        debug!(?point, "selection dragged");
        self.bus.publish(MapEvent::CoordinatesChanged { point });
    }

    /// Place the pin programmatically, without announcing it.
    pub fn set_coordinates(&self, point: GeoPoint) -> Result<(), MapError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(MapError::SurfaceDisposed);
        }
        self.put_marker(point);
        self.surface
            .jump_to(point, self.settings.camera.selection_zoom);
        Ok(())
    }

    /// Geocode `query` and, on a hit, move the selection there.
    ///
    /// A hit behaves like a click: pin placed, camera flown in, point
    /// announced. A miss changes nothing. Geocoder failures raise a
    /// warning notice and propagate.
    pub async fn search(&self, query: &str) -> Result<Option<GeoPoint>, MapError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(MapError::SurfaceDisposed);
        }
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match self.geocoder.geocode(trimmed).await {
            Ok(Some(point)) => {
                self.put_marker(point);
                self.surface
                    .fly_to(point, self.settings.camera.selection_zoom);
                self.bus.publish(MapEvent::CoordinatesChanged { point });
                Ok(Some(point))
            }
            Ok(None) => {
                debug!(query = trimmed, "no geocoding hit");
                Ok(None)
            }
            Err(err) => {
                warn!(%err, query = trimmed, "geocoding failed");
                self.bus.publish(MapEvent::NoticeRaised(Notice::warning(
                    "No se pudo buscar la dirección.",
                )));
                Err(err.into())
            }
        }
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.state.lock().coords
    }

    pub fn teardown(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        for subscription in self.subscriptions.lock().drain(..) {
            self.surface.unsubscribe(subscription);
        }
        let marker = self.state.lock().marker.take();
        if let Some(id) = marker {
            self.surface.remove_marker(id);
        }
        info!("selection map torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessSurface, SurfaceOp};
    use rm_core::MapEventSubscriber;
    use rm_data::{DataError, StaticGeocoder};

    struct Recorder {
        seen: Mutex<Vec<MapEvent>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }

        fn coordinate_changes(&self) -> Vec<GeoPoint> {
            self.seen
                .lock()
                .iter()
                .filter_map(|event| match event {
                    MapEvent::CoordinatesChanged { point } => Some(*point),
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

    struct FailingGeocoder;

    #[async_trait::async_trait]
    impl Geocoder for FailingGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<GeoPoint>, DataError> {
            Err(DataError::Transport("geocoder offline".to_string()))
        }
    }

    fn point(lng: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lng, lat).unwrap()
    }

    fn campus() -> GeoPoint {
        point(-99.1871, 19.3324)
    }

    fn harness(
        initial: Option<GeoPoint>,
    ) -> (Arc<HeadlessSurface>, Arc<SelectionMap>, Arc<Recorder>) {
        let surface = HeadlessSurface::centered(point(0.0, 0.0), 1.0);
        let bus = Arc::new(EventBus::new());
        let recorder = Recorder::new();
        bus.subscribe(recorder.clone());
        let geocoder = Arc::new(StaticGeocoder::new(vec![(
            "Ciudad Universitaria".to_string(),
            campus(),
        )]));
        let map = SelectionMap::new(surface.clone(), bus, geocoder, MapSettings::default(), initial);
        (surface, map, recorder)
    }

    #[tokio::test]
    async fn test_initial_coordinates_place_pin_silently() {
        let initial = point(-99.14, 19.41);
        let (surface, map, recorder) = harness(Some(initial));

        assert_eq!(
            surface.ops()[0],
            SurfaceOp::JumpTo {
                center: initial,
                zoom: 16.0
            }
        );
        assert_eq!(surface.marker_count(), 1);
        assert_eq!(map.coordinates(), Some(initial));
        assert!(recorder.coordinate_changes().is_empty());
    }

    #[tokio::test]
    async fn test_without_initial_coordinates_shows_fallback() {
        let (surface, map, _recorder) = harness(None);

        assert_eq!(
            surface.ops()[0],
            SurfaceOp::JumpTo {
                center: point(-99.1332, 19.4326),
                zoom: 12.0
            }
        );
        assert_eq!(surface.marker_count(), 0);
        assert_eq!(map.coordinates(), None);
    }

    #[tokio::test]
    async fn test_click_places_pin_and_announces() {
        let (surface, map, recorder) = harness(None);
        let chosen = point(-99.15, 19.42);

        surface.emit_click(chosen);

        assert_eq!(map.coordinates(), Some(chosen));
        assert_eq!(surface.marker_count(), 1);
        assert_eq!(
            surface.markers_with_style(&MarkerStyle::SelectionPin)[0]
                .1
                .position,
            chosen
        );
        assert_eq!(recorder.coordinate_changes(), vec![chosen]);
    }

    #[tokio::test]
    async fn test_second_click_moves_the_same_pin() {
        let (surface, map, recorder) = harness(None);

        surface.emit_click(point(-99.15, 19.42));
        surface.emit_click(point(-99.18, 19.39));

        assert_eq!(surface.marker_count(), 1);
        assert_eq!(map.coordinates(), Some(point(-99.18, 19.39)));
        assert_eq!(
            recorder.coordinate_changes(),
            vec![point(-99.15, 19.42), point(-99.18, 19.39)]
        );
    }

    #[tokio::test]
    async fn test_drag_end_updates_and_announces() {
        let (surface, map, recorder) = harness(Some(point(-99.14, 19.41)));
        let pin = surface.markers_with_style(&MarkerStyle::SelectionPin)[0].0;
        let dropped = point(-99.145, 19.405);

        surface.emit_marker_drag_end(pin, dropped);

        assert_eq!(map.coordinates(), Some(dropped));
        assert_eq!(recorder.coordinate_changes(), vec![dropped]);
    }

    #[tokio::test]
    async fn test_foreign_marker_drag_is_ignored() {
        let (surface, map, recorder) = harness(Some(point(-99.14, 19.41)));
        let foreign = surface.place_marker(MarkerSpec::new(
            point(-99.0, 19.0),
            MarkerStyle::UniversityPin,
        ));

        surface.emit_marker_drag_end(foreign, point(-98.9, 19.1));

        assert_eq!(map.coordinates(), Some(point(-99.14, 19.41)));
        assert!(recorder.coordinate_changes().is_empty());
    }

    #[tokio::test]
    async fn test_set_coordinates_is_silent() {
        let (surface, map, recorder) = harness(None);
        let fed = point(-99.16, 19.40);

        map.set_coordinates(fed).unwrap();

        assert_eq!(map.coordinates(), Some(fed));
        assert!(surface.ops().contains(&SurfaceOp::JumpTo {
            center: fed,
            zoom: 16.0
        }));
        assert!(recorder.coordinate_changes().is_empty());
    }

    #[tokio::test]
    async fn test_search_hit_flies_in_and_announces() {
        let (surface, map, recorder) = harness(None);

        let hit = map.search("ciudad universitaria").await.unwrap();

        assert_eq!(hit, Some(campus()));
        assert_eq!(map.coordinates(), Some(campus()));
        assert!(surface.ops().contains(&SurfaceOp::FlyTo {
            center: campus(),
            zoom: 16.0
        }));
        assert_eq!(recorder.coordinate_changes(), vec![campus()]);
    }

    #[tokio::test]
    async fn test_search_miss_changes_nothing() {
        let (surface, map, recorder) = harness(None);

        let hit = map.search("polanco").await.unwrap();

        assert_eq!(hit, None);
        assert_eq!(surface.marker_count(), 0);
        assert_eq!(map.coordinates(), None);
        assert!(recorder.coordinate_changes().is_empty());
    }

    #[tokio::test]
    async fn test_blank_search_short_circuits() {
        let (_surface, map, recorder) = harness(None);

        let hit = map.search("   ").await.unwrap();

        assert_eq!(hit, None);
        assert!(recorder.coordinate_changes().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_raises_notice() {
        let surface = HeadlessSurface::centered(point(0.0, 0.0), 1.0);
        let bus = Arc::new(EventBus::new());
        let recorder = Recorder::new();
        bus.subscribe(recorder.clone());
        let map = SelectionMap::new(
            surface,
            bus,
            Arc::new(FailingGeocoder),
            MapSettings::default(),
            None,
        );

        let result = map.search("roma norte").await;

        assert!(matches!(result, Err(MapError::Data(_))));
        let notices: Vec<String> = recorder
            .seen
            .lock()
            .iter()
            .filter_map(|event| match event {
                MapEvent::NoticeRaised(notice) => Some(notice.message.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(notices, vec!["No se pudo buscar la dirección.".to_string()]);
    }

    #[tokio::test]
    async fn test_teardown_removes_pin_and_detaches() {
        let (surface, map, recorder) = harness(None);
        surface.emit_click(point(-99.15, 19.42));

        map.teardown();
        surface.emit_click(point(-99.18, 19.39));

        assert_eq!(surface.marker_count(), 0);
        assert_eq!(recorder.coordinate_changes().len(), 1);
        assert!(matches!(
            map.set_coordinates(point(-99.18, 19.39)),
            Err(MapError::SurfaceDisposed)
        ));
    }
}
