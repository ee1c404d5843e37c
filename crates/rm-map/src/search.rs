//! Search page map
//!
//! The controller behind the listing search page: renders grouped listing
//! markers, keeps the university layer in sync with the camera, and reports
//! what happened on the bus. Listing and catalog loads degrade
//! independently; a dead catalog endpoint must not blank the listings the
//! user searched for, and vice versa.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use rm_core::{EventBus, MapEvent, MapSettings, Notice};
use rm_data::{Listing, ListingFilter, ListingSource, PoiCatalogSource};

use crate::aggregate::{CoordinateAggregator, MarkerGroup};
use crate::error::MapError;
use crate::poi_layer::ViewportCuller;
use crate::surface::{MapSurface, SubscriptionId};

pub struct SearchMap {
    surface: Arc<dyn MapSurface>,
    bus: Arc<EventBus>,
    aggregator: Mutex<CoordinateAggregator>,
    culler: Arc<ViewportCuller>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    disposed: AtomicBool,
}

impl SearchMap {
    /// Build the controller and point the camera at the city-wide view.
    ///
    /// Surface handlers hold weak references, so dropping the controller
    /// detaches them even without an explicit [`teardown`].
    ///
    /// [`teardown`]: SearchMap::teardown
    pub fn new(surface: Arc<dyn MapSurface>, bus: Arc<EventBus>, settings: MapSettings) -> Arc<Self> {
        surface.jump_to(settings.camera.default_center, settings.camera.search_zoom);

        let culler = ViewportCuller::new(surface.clone(), bus.clone(), settings.poi.clone());
        let map = Arc::new(Self {
            surface,
            bus,
            aggregator: Mutex::new(CoordinateAggregator::new(settings)),
            culler,
            subscriptions: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&map);
        let move_end = map.surface.on_move_end(Box::new(move |viewport| {
            if let Some(map) = weak.upgrade() {
                map.culler.on_viewport_changed(viewport);
            }
        }));
        let weak = Arc::downgrade(&map);
        let marker_click = map.surface.on_marker_click(Box::new(move |marker| {
            if let Some(map) = weak.upgrade() {
                map.aggregator.lock().click(map.surface.as_ref(), marker);
            }
        }));
        map.subscriptions.lock().extend([move_end, marker_click]);
        map
    }

    /// Fetch listings and the university catalog and render both.
    ///
    /// The two loads fail independently: either failure renders that layer
    /// empty and raises a warning notice while the other proceeds.
    pub async fn load(
        &self,
        listings: &dyn ListingSource,
        catalog: &dyn PoiCatalogSource,
    ) -> Result<(), MapError> {
        match listings.fetch_listings().await {
            Ok(all) => {
                self.set_listings(&all)?;
            }
            Err(err) => {
                warn!(%err, source = listings.source_name(), "listing fetch failed");
                self.set_listings(&[])?;
                self.bus.publish(MapEvent::NoticeRaised(Notice::warning(
                    "No se pudieron cargar las propiedades.",
                )));
            }
        }

        match self.culler.load_catalog(catalog).await {
            Ok(count) => {
                info!(count, "university catalog ready");
                self.culler.refresh(&self.surface.viewport());
            }
            Err(err) => {
                warn!(%err, source = catalog.source_name(), "catalog fetch failed");
                self.bus.publish(MapEvent::NoticeRaised(Notice::warning(
                    "No se pudieron cargar las universidades.",
                )));
            }
        }
        Ok(())
    }

    /// Fetch only the listings matching `filter` and render them.
    pub async fn load_filtered(
        &self,
        listings: &dyn ListingSource,
        filter: &ListingFilter,
    ) -> Result<usize, MapError> {
        let matching = listings.fetch_filtered(filter).await?;
        self.set_listings(&matching)
    }

    /// Replace the rendered listing set. Returns the group count.
    pub fn set_listings(&self, listings: &[Listing]) -> Result<usize, MapError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(MapError::SurfaceDisposed);
        }
        let groups = self
            .aggregator
            .lock()
            .render(self.surface.as_ref(), listings);
        self.bus.publish(MapEvent::ListingsRendered {
            groups,
            listings: listings.len(),
        });
        Ok(groups)
    }

    /// Report that the user chose a listing entry from a popup.
    pub fn activate_listing(&self, listing_id: i64) {
        debug!(listing_id, "listing activated");
        self.bus.publish(MapEvent::ListingActivated { listing_id });
    }

    /// Current listing groups in render order.
    pub fn groups(&self) -> Vec<MarkerGroup> {
        self.aggregator.lock().groups().to_vec()
    }

    pub fn marker_count(&self) -> usize {
        self.aggregator.lock().marker_count()
    }

    pub fn poi_count(&self) -> usize {
        self.culler.rendered_count()
    }

    /// Detach surface handlers and cancel pending POI work.
    pub fn teardown(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        for subscription in self.subscriptions.lock().drain(..) {
            self.surface.unsubscribe(subscription);
        }
        self.culler.teardown();
        info!("search map torn down");
    }
}
