//! In-memory map surface
//!
//! Records every operation it receives and keeps enough camera/marker state
//! for controllers to query, so tests and the demo binary can run the whole
//! map layer without a rendering engine. Camera geometry is synthetic: moves
//! recenter the current visible span rather than reprojecting tiles, and a
//! fit lands exactly on the requested rectangle at its zoom ceiling.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};

use rm_core::{GeoBounds, GeoPoint, Viewport};

use super::{
    ClickHandler, MapSurface, MarkerClickHandler, MarkerDragEndHandler, MarkerId, MarkerSpec,
    MarkerStyle, MoveEndHandler, PopupContent, SubscriptionId,
};

/// Half-width of the synthetic visible span, in degrees.
const HALF_SPAN: f64 = 0.05;

/// One operation the surface was asked to perform, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    JumpTo { center: GeoPoint, zoom: f64 },
    EaseTo { center: GeoPoint, zoom: f64 },
    FlyTo { center: GeoPoint, zoom: f64 },
    FitBounds { bounds: GeoBounds, padding: f64, max_zoom: f64 },
    PlaceMarker { id: MarkerId, position: GeoPoint, style: MarkerStyle },
    MoveMarker { id: MarkerId, position: GeoPoint },
    RemoveMarker { id: MarkerId },
    TogglePopup { id: MarkerId },
}

/// A marker currently on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    pub position: GeoPoint,
    pub style: MarkerStyle,
    pub title: Option<String>,
    pub popup: Option<PopupContent>,
    pub popup_open: bool,
}

struct SurfaceState {
    viewport: Viewport,
    markers: AHashMap<MarkerId, PlacedMarker>,
    disposed: bool,
}

#[derive(Default)]
struct HandlerTable {
    move_end: Vec<(SubscriptionId, Arc<dyn Fn(Viewport) + Send + Sync>)>,
    click: Vec<(SubscriptionId, Arc<dyn Fn(GeoPoint) + Send + Sync>)>,
    marker_click: Vec<(SubscriptionId, Arc<dyn Fn(MarkerId) + Send + Sync>)>,
    marker_drag_end: Vec<(SubscriptionId, Arc<dyn Fn(MarkerId, GeoPoint) + Send + Sync>)>,
}

/// Recording [`MapSurface`] implementation.
pub struct HeadlessSurface {
    state: RwLock<SurfaceState>,
    handlers: RwLock<HandlerTable>,
    ops: Mutex<Vec<SurfaceOp>>,
}

fn clamped_point(lng: f64, lat: f64) -> GeoPoint {
    GeoPoint {
        lng: lng.clamp(-180.0, 180.0),
        lat: lat.clamp(-90.0, 90.0),
    }
}

fn centered_viewport(center: GeoPoint, half_lng: f64, half_lat: f64, zoom: f64) -> Viewport {
    Viewport::new(
        clamped_point(center.lng - half_lng, center.lat - half_lat),
        clamped_point(center.lng + half_lng, center.lat + half_lat),
        zoom,
    )
}

impl HeadlessSurface {
    /// Surface whose camera starts centered on `center` at `zoom`.
    pub fn centered(center: GeoPoint, zoom: f64) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(SurfaceState {
                viewport: centered_viewport(center, HALF_SPAN, HALF_SPAN, zoom),
                markers: AHashMap::new(),
                disposed: false,
            }),
            handlers: RwLock::new(HandlerTable::default()),
            ops: Mutex::new(Vec::new()),
        })
    }

    fn record(&self, op: SurfaceOp) {
        self.ops.lock().push(op);
    }

    fn recenter(&self, center: GeoPoint, zoom: f64) {
        let mut state = self.state.write();
        let bounds = state.viewport.bounds;
        let half_lng = (bounds.north_east.lng - bounds.south_west.lng) / 2.0;
        let half_lat = (bounds.north_east.lat - bounds.south_west.lat) / 2.0;
        state.viewport = centered_viewport(center, half_lng, half_lat, zoom);
    }

    /// Ops recorded so far, in call order.
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.lock().clone()
    }

    /// Drain the recorded ops, leaving the log empty.
    pub fn take_ops(&self) -> Vec<SurfaceOp> {
        std::mem::take(&mut *self.ops.lock())
    }

    pub fn marker_count(&self) -> usize {
        self.state.read().markers.len()
    }

    pub fn marker(&self, id: MarkerId) -> Option<PlacedMarker> {
        self.state.read().markers.get(&id).cloned()
    }

    /// Snapshot of every marker on the surface. Order is not meaningful.
    pub fn markers(&self) -> Vec<(MarkerId, PlacedMarker)> {
        self.state
            .read()
            .markers
            .iter()
            .map(|(id, marker)| (*id, marker.clone()))
            .collect()
    }

    /// Markers with the given style, for test assertions.
    pub fn markers_with_style(&self, style: &MarkerStyle) -> Vec<(MarkerId, PlacedMarker)> {
        self.markers()
            .into_iter()
            .filter(|(_, marker)| marker.style == *style)
            .collect()
    }

    /// After this call every surface operation is ignored.
    pub fn dispose(&self) {
        self.state.write().disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.state.read().disposed
    }

    /// Simulate the camera settling at `viewport`, then notify move-end
    /// subscribers.
    pub fn emit_move_end(&self, viewport: Viewport) {
        if self.is_disposed() {
            return;
        }
        self.state.write().viewport = viewport;
        let handlers: Vec<_> = {
            let table = self.handlers.read();
            table.move_end.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in handlers {
            handler(viewport);
        }
    }

    /// Simulate a click on the base map.
    pub fn emit_click(&self, point: GeoPoint) {
        if self.is_disposed() {
            return;
        }
        let handlers: Vec<_> = {
            let table = self.handlers.read();
            table.click.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in handlers {
            handler(point);
        }
    }

    /// Simulate a click on a marker.
    pub fn emit_marker_click(&self, id: MarkerId) {
        if self.is_disposed() {
            return;
        }
        let handlers: Vec<_> = {
            let table = self.handlers.read();
            table.marker_click.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in handlers {
            handler(id);
        }
    }

    /// Simulate the user finishing a marker drag at `position`.
    pub fn emit_marker_drag_end(&self, id: MarkerId, position: GeoPoint) {
        if self.is_disposed() {
            return;
        }
        {
            let mut state = self.state.write();
            if let Some(marker) = state.markers.get_mut(&id) {
                marker.position = position;
            }
        }
        let handlers: Vec<_> = {
            let table = self.handlers.read();
            table
                .marker_drag_end
                .iter()
                .map(|(_, h)| h.clone())
                .collect()
        };
        for handler in handlers {
            handler(id, position);
        }
    }
}

impl MapSurface for HeadlessSurface {
    fn jump_to(&self, center: GeoPoint, zoom: f64) {
        if self.is_disposed() {
            return;
        }
        self.recenter(center, zoom);
        self.record(SurfaceOp::JumpTo { center, zoom });
    }

    fn ease_to(&self, center: GeoPoint, zoom: f64) {
        if self.is_disposed() {
            return;
        }
        self.recenter(center, zoom);
        self.record(SurfaceOp::EaseTo { center, zoom });
    }

    fn fly_to(&self, center: GeoPoint, zoom: f64) {
        if self.is_disposed() {
            return;
        }
        self.recenter(center, zoom);
        self.record(SurfaceOp::FlyTo { center, zoom });
    }

    fn fit_bounds(&self, bounds: GeoBounds, padding: f64, max_zoom: f64) {
        if self.is_disposed() {
            return;
        }
        {
            let mut state = self.state.write();
            let normalized = GeoBounds::from_corners(bounds.south_west, bounds.north_east);
            state.viewport = Viewport {
                bounds: normalized,
                zoom: max_zoom,
            };
        }
        self.record(SurfaceOp::FitBounds {
            bounds,
            padding,
            max_zoom,
        });
    }

    fn viewport(&self) -> Viewport {
        self.state.read().viewport
    }

    fn place_marker(&self, spec: MarkerSpec) -> MarkerId {
        let id = MarkerId::new();
        if self.is_disposed() {
            return id;
        }
        {
            let mut state = self.state.write();
            state.markers.insert(
                id,
                PlacedMarker {
                    position: spec.position,
                    style: spec.style.clone(),
                    title: spec.title,
                    popup: spec.popup,
                    popup_open: false,
                },
            );
        }
        self.record(SurfaceOp::PlaceMarker {
            id,
            position: spec.position,
            style: spec.style,
        });
        id
    }

    fn move_marker(&self, id: MarkerId, position: GeoPoint) {
        if self.is_disposed() {
            return;
        }
        {
            let mut state = self.state.write();
            if let Some(marker) = state.markers.get_mut(&id) {
                marker.position = position;
            }
        }
        self.record(SurfaceOp::MoveMarker { id, position });
    }

    fn remove_marker(&self, id: MarkerId) {
        if self.is_disposed() {
            return;
        }
        self.state.write().markers.remove(&id);
        self.record(SurfaceOp::RemoveMarker { id });
    }

    fn toggle_popup(&self, id: MarkerId) {
        if self.is_disposed() {
            return;
        }
        {
            let mut state = self.state.write();
            if let Some(marker) = state.markers.get_mut(&id) {
                marker.popup_open = !marker.popup_open;
            }
        }
        self.record(SurfaceOp::TogglePopup { id });
    }

    fn on_move_end(&self, handler: MoveEndHandler) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.handlers.write().move_end.push((id, Arc::from(handler)));
        id
    }

    fn on_click(&self, handler: ClickHandler) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.handlers.write().click.push((id, Arc::from(handler)));
        id
    }

    fn on_marker_click(&self, handler: MarkerClickHandler) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.handlers
            .write()
            .marker_click
            .push((id, Arc::from(handler)));
        id
    }

    fn on_marker_drag_end(&self, handler: MarkerDragEndHandler) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.handlers
            .write()
            .marker_drag_end
            .push((id, Arc::from(handler)));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut table = self.handlers.write();
        table.move_end.retain(|(sub, _)| *sub != id);
        table.click.retain(|(sub, _)| *sub != id);
        table.marker_click.retain(|(sub, _)| *sub != id);
        table.marker_drag_end.retain(|(sub, _)| *sub != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn point(lng: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lng, lat).unwrap()
    }

    fn surface() -> Arc<HeadlessSurface> {
        HeadlessSurface::centered(point(-99.1332, 19.4326), 11.0)
    }

    #[test]
    fn test_place_and_remove_markers() {
        let surface = surface();
        let id = surface.place_marker(MarkerSpec::new(
            point(-99.1, 19.4),
            MarkerStyle::HomePin { badge: None },
        ));
        assert_eq!(surface.marker_count(), 1);
        assert_eq!(surface.marker(id).unwrap().position, point(-99.1, 19.4));

        surface.remove_marker(id);
        assert_eq!(surface.marker_count(), 0);
        assert!(surface.marker(id).is_none());
    }

    #[test]
    fn test_camera_ops_recorded_in_order() {
        let surface = surface();
        surface.jump_to(point(-99.2, 19.3), 12.0);
        surface.ease_to(point(-99.1, 19.4), 14.0);
        let bounds = GeoBounds::from_corners(point(-99.2, 19.3), point(-99.1, 19.4));
        surface.fit_bounds(bounds, 60.0, 15.0);

        let ops = surface.ops();
        assert_eq!(
            ops,
            vec![
                SurfaceOp::JumpTo {
                    center: point(-99.2, 19.3),
                    zoom: 12.0
                },
                SurfaceOp::EaseTo {
                    center: point(-99.1, 19.4),
                    zoom: 14.0
                },
                SurfaceOp::FitBounds {
                    bounds,
                    padding: 60.0,
                    max_zoom: 15.0
                },
            ]
        );
        assert_eq!(surface.viewport().zoom, 15.0);
        assert_eq!(surface.viewport().bounds, bounds);
    }

    #[test]
    fn test_move_end_updates_viewport_and_notifies() {
        let surface = surface();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        surface.on_move_end(Box::new(move |viewport| sink.lock().push(viewport)));

        let viewport = Viewport::new(point(-99.3, 19.2), point(-99.0, 19.5), 13.0);
        surface.emit_move_end(viewport);

        assert_eq!(surface.viewport(), viewport);
        assert_eq!(seen.lock().as_slice(), &[viewport]);
    }

    #[test]
    fn test_unsubscribe_detaches_handler() {
        let surface = surface();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = seen.clone();
        let sub = surface.on_click(Box::new(move |_| *sink.lock() += 1));

        surface.emit_click(point(-99.1, 19.4));
        surface.unsubscribe(sub);
        surface.emit_click(point(-99.1, 19.4));

        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_drag_end_moves_marker_before_notifying() {
        let surface = surface();
        let id = surface.place_marker(MarkerSpec::new(point(-99.1, 19.4), MarkerStyle::SelectionPin));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        surface.on_marker_drag_end(Box::new(move |id, position| sink.lock().push((id, position))));

        surface.emit_marker_drag_end(id, point(-99.15, 19.45));

        assert_eq!(surface.marker(id).unwrap().position, point(-99.15, 19.45));
        assert_eq!(seen.lock().as_slice(), &[(id, point(-99.15, 19.45))]);
    }

    #[test]
    fn test_toggle_popup_flips_state() {
        let surface = surface();
        let id = surface.place_marker(MarkerSpec::new(
            point(-99.1, 19.4),
            MarkerStyle::HomePin { badge: Some(2) },
        ));
        assert!(!surface.marker(id).unwrap().popup_open);
        surface.toggle_popup(id);
        assert!(surface.marker(id).unwrap().popup_open);
        surface.toggle_popup(id);
        assert!(!surface.marker(id).unwrap().popup_open);
    }

    #[test]
    fn test_disposed_surface_ignores_everything() {
        let surface = surface();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = seen.clone();
        surface.on_move_end(Box::new(move |_| *sink.lock() += 1));

        surface.dispose();
        surface.jump_to(point(-99.2, 19.3), 12.0);
        let id = surface.place_marker(MarkerSpec::new(point(-99.1, 19.4), MarkerStyle::UserPin));
        surface.emit_move_end(Viewport::new(point(-99.3, 19.2), point(-99.0, 19.5), 13.0));

        assert!(surface.ops().is_empty());
        assert_eq!(surface.marker_count(), 0);
        assert!(surface.marker(id).is_none());
        assert_eq!(*seen.lock(), 0);
    }
}
