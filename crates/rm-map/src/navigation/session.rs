//! Navigation session state machine
//!
//! One session tracks the user toward one destination. Starting requests a
//! position watch; every fix moves the user marker, feeds the routing
//! overlay, and re-fits the camera over user and destination so both stay
//! on screen while the user walks. Stream or routing failures end the
//! session and release the watch, so a dead session never holds platform
//! resources.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info};

use rm_core::settings::CameraSettings;
use rm_core::{EventBus, GeoBounds, GeoPoint, MapEvent, Notice};

use crate::error::MapError;
use crate::navigation::location::{
    LocationErrorHandler, LocationStream, LocationUpdateHandler, WatchHandle,
};
use crate::navigation::routing::{RoutingEvent, RoutingOverlay};
use crate::surface::{MapSurface, MarkerId, MarkerSpec, MarkerStyle};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// Never started
    Idle,
    /// Watch requested, no fix yet
    RequestingLocation,
    /// Receiving fixes
    Tracking,
    /// Ended deliberately
    Stopped,
    /// Ended by a stream or routing failure
    Failed,
}

impl NavState {
    /// Whether the session is requesting or consuming location updates.
    pub fn is_live(self) -> bool {
        matches!(self, NavState::RequestingLocation | NavState::Tracking)
    }
}

struct SessionState {
    nav: NavState,
    origin: Option<GeoPoint>,
    watch: Option<WatchHandle>,
    user_marker: Option<MarkerId>,
}

/// Live walking navigation toward a fixed destination.
pub struct NavigationSession {
    surface: Arc<dyn MapSurface>,
    overlay: Arc<dyn RoutingOverlay>,
    stream: Arc<dyn LocationStream>,
    bus: Arc<EventBus>,
    camera: CameraSettings,
    destination: GeoPoint,
    state: RwLock<SessionState>,
}

impl NavigationSession {
    pub fn new(
        surface: Arc<dyn MapSurface>,
        overlay: Arc<dyn RoutingOverlay>,
        stream: Arc<dyn LocationStream>,
        bus: Arc<EventBus>,
        camera: CameraSettings,
        destination: GeoPoint,
    ) -> Arc<Self> {
        Arc::new(Self {
            surface,
            overlay,
            stream,
            bus,
            camera,
            destination,
            state: RwLock::new(SessionState {
                nav: NavState::Idle,
                origin: None,
                watch: None,
                user_marker: None,
            }),
        })
    }

    /// Begin tracking toward the destination.
    ///
    /// Idempotent while live: a second call while requesting or tracking
    /// changes nothing and keeps the existing watch. A stopped or failed
    /// session may start over. Errs when the stream rejects the watch,
    /// after moving the session to `Failed` and raising a notice.
    pub fn start(self: &Arc<Self>) -> Result<(), MapError> {
        {
            let mut state = self.state.write();
            if state.nav.is_live() {
                debug!("navigation already running");
                return Ok(());
            }
            state.nav = NavState::RequestingLocation;
            state.origin = None;
        }
        self.overlay.set_destination(self.destination);
        info!(destination = ?self.destination, "navigation requested");

        let weak = Arc::downgrade(self);
        let on_update: LocationUpdateHandler = Box::new(move |point: GeoPoint| {
            if let Some(session) = weak.upgrade() {
                session.on_position(point);
            }
        });
        let weak = Arc::downgrade(self);
        let on_error: LocationErrorHandler = Box::new(move |err: &MapError| {
            if let Some(session) = weak.upgrade() {
                session.on_location_error(err);
            }
        });

        match self.stream.watch(on_update, on_error) {
            Ok(handle) => {
                self.state.write().watch = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.on_location_error(&err);
                Err(err)
            }
        }
    }

    fn on_position(&self, point: GeoPoint) {
        let mut state = self.state.write();
        match state.nav {
            NavState::RequestingLocation => {
                state.nav = NavState::Tracking;
                info!(position = ?point, "first fix received, tracking");
            }
            NavState::Tracking => {}
            // A cancelled watch can still have a delivery in flight.
            _ => return,
        }
        state.origin = Some(point);
        match state.user_marker {
            Some(id) => self.surface.move_marker(id, point),
            None => {
                let id = self
                    .surface
                    .place_marker(MarkerSpec::new(point, MarkerStyle::UserPin));
                state.user_marker = Some(id);
            }
        }
        drop(state);

        self.overlay.set_origin(point);
        self.surface.fit_bounds(
            GeoBounds::from_corners(point, self.destination),
            self.camera.fit_padding,
            self.camera.nav_fit_max_zoom,
        );
    }

    fn on_location_error(&self, err: &MapError) {
        error!(%err, "location stream failed");
        let message = match err {
            MapError::LocationUnavailable(_) => "Tu navegador no soporta geolocalización.",
            _ => "No pudimos obtener tu ubicación. Revisa permisos de ubicación.",
        };
        self.fail_with_notice(message);
    }

    /// React to overlay lifecycle reports.
    ///
    /// A cleared route ends a live session the same way [`stop`] does; a
    /// routing failure ends it as `Failed` with a notice. Reports reaching
    /// a session that is not live are ignored.
    ///
    /// [`stop`]: NavigationSession::stop
    pub fn on_routing_event(&self, event: &RoutingEvent) {
        match event {
            RoutingEvent::Route => {
                debug!("route drawn");
            }
            RoutingEvent::Clear => {
                if self.state.read().nav.is_live() {
                    self.stop();
                }
            }
            RoutingEvent::Error(message) => {
                if self.state.read().nav.is_live() {
                    error!(reason = %message, "routing failed");
                    self.fail_with_notice("No se pudo calcular la ruta.");
                }
            }
        }
    }

    /// End the session, cancel the watch, and remove the user marker.
    ///
    /// Safe to call repeatedly and in any state.
    pub fn stop(&self) {
        let mut state = self.state.write();
        if state.nav == NavState::Stopped {
            return;
        }
        state.nav = NavState::Stopped;
        let watch = state.watch.take();
        let marker = state.user_marker.take();
        drop(state);

        self.release(watch, marker);
        info!("navigation stopped");
    }

    fn fail_with_notice(&self, message: &str) {
        let mut state = self.state.write();
        if !state.nav.is_live() {
            return;
        }
        state.nav = NavState::Failed;
        let watch = state.watch.take();
        let marker = state.user_marker.take();
        drop(state);

        self.release(watch, marker);
        self.bus
            .publish(MapEvent::NoticeRaised(Notice::blocking(message)));
    }

    fn release(&self, watch: Option<WatchHandle>, marker: Option<MarkerId>) {
        if let Some(handle) = watch {
            self.stream.cancel(handle);
        }
        if let Some(id) = marker {
            self.surface.remove_marker(id);
        }
    }

    pub fn state(&self) -> NavState {
        self.state.read().nav
    }

    /// Latest fix, kept through stop so the host can show where tracking
    /// ended.
    pub fn origin(&self) -> Option<GeoPoint> {
        self.state.read().origin
    }

    pub fn destination(&self) -> GeoPoint {
        self.destination
    }
}
