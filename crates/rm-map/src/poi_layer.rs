//! University POI layer
//!
//! Keeps the full university catalog in memory after one fetch and shows
//! only the entries inside the current viewport. Camera moves arrive in
//! bursts while the user pans, so each one restarts a debounce timer and
//! only the final rest position triggers a recompute. Below the minimum
//! zoom the layer renders nothing; a city-wide view does not need a pin
//! per campus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use rm_core::settings::PoiSettings;
use rm_core::{EventBus, MapEvent, Viewport};
use rm_data::{DataError, Poi, PoiCatalogSource};

use crate::markers::MarkerTable;
use crate::surface::{MapSurface, MarkerSpec, MarkerStyle};

/// Viewport-culled marker layer over a fetch-once POI catalog.
pub struct ViewportCuller {
    surface: Arc<dyn MapSurface>,
    bus: Arc<EventBus>,
    settings: PoiSettings,
    catalog: RwLock<Option<Arc<Vec<Poi>>>>,
    table: Mutex<MarkerTable>,
    pending: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl ViewportCuller {
    pub fn new(surface: Arc<dyn MapSurface>, bus: Arc<EventBus>, settings: PoiSettings) -> Arc<Self> {
        Arc::new(Self {
            surface,
            bus,
            settings,
            catalog: RwLock::new(None),
            table: Mutex::new(MarkerTable::new()),
            pending: Mutex::new(None),
            disposed: AtomicBool::new(false),
        })
    }

    /// Fetch the catalog if it has not been loaded yet.
    ///
    /// The catalog is immutable for the life of the layer; repeated calls
    /// return the cached size without touching the source again. Until a
    /// load succeeds, culling passes render nothing.
    pub async fn load_catalog(&self, source: &dyn PoiCatalogSource) -> Result<usize, DataError> {
        if let Some(catalog) = self.catalog.read().as_ref() {
            return Ok(catalog.len());
        }
        let pois = source.fetch_catalog().await?;
        let count = pois.len();
        *self.catalog.write() = Some(Arc::new(pois));
        info!(count, source = source.source_name(), "university catalog loaded");
        Ok(count)
    }

    /// Restart the debounce timer for a camera move.
    ///
    /// The previous timer, if still pending, is cancelled before the new
    /// one is armed, so a pan burst collapses into one recompute for the
    /// final viewport. The timer task holds only a weak reference; dropping
    /// the layer cancels the recompute implicitly.
    pub fn on_viewport_changed(self: &Arc<Self>, viewport: Viewport) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let weak = Arc::downgrade(self);
        let delay = self.settings.debounce();

        let mut pending = self.pending.lock();
        if let Some(timer) = pending.take() {
            timer.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(culler) = weak.upgrade() {
                culler.refresh(&viewport);
            }
        }));
    }

    /// Recompute the visible marker set for `viewport` immediately.
    ///
    /// No-op until the catalog has loaded. Below the minimum zoom every
    /// marker is removed and a zero-count pass is announced.
    pub fn refresh(&self, viewport: &Viewport) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let Some(catalog) = self.catalog.read().clone() else {
            return;
        };

        let mut table = self.table.lock();
        if viewport.zoom < self.settings.min_zoom {
            table.clear(self.surface.as_ref());
            drop(table);
            self.bus.publish(MapEvent::PoiLayerRendered { visible: 0 });
            return;
        }

        let visible: Vec<(String, MarkerSpec)> = catalog
            .iter()
            .filter(|poi| viewport.bounds.contains(poi.coords))
            .map(|poi| {
                let spec = MarkerSpec::new(poi.coords, MarkerStyle::UniversityPin)
                    .with_title(poi.name.clone());
                (format!("poi:{}", poi.id), spec)
            })
            .collect();
        let count = visible.len();
        table.replace_all(self.surface.as_ref(), visible);
        drop(table);

        debug!(visible = count, zoom = viewport.zoom, "university layer refreshed");
        self.bus.publish(MapEvent::PoiLayerRendered { visible: count });
    }

    /// Markers currently on the surface for this layer.
    pub fn rendered_count(&self) -> usize {
        self.table.lock().len()
    }

    /// Cancel any pending recompute and stop reacting to camera moves.
    pub fn teardown(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        if let Some(timer) = self.pending.lock().take() {
            timer.abort();
        }
    }
}
