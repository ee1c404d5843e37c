//! Map layer event bus
//!
//! The seam between the map layer and the rest of the application: forms
//! listen for selection coordinates, page routing listens for activated
//! listings, toast presentation listens for notices. Subscribers are held
//! weakly so a torn-down view stops receiving events without explicit
//! unsubscription.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::geo::GeoPoint;
use crate::notice::Notice;

/// Events published by the map layer for the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The listing marker set was rebuilt
    ListingsRendered { groups: usize, listings: usize },

    /// The POI layer finished a culling pass
    PoiLayerRendered { visible: usize },

    /// The user chose a listing entry from a marker popup
    ListingActivated { listing_id: i64 },

    /// The user placed or dragged the selection marker
    CoordinatesChanged { point: GeoPoint },

    /// A user-facing message was raised
    NoticeRaised(Notice),
}

/// Trait for components that react to map layer events.
pub trait MapEventSubscriber: Send + Sync {
    fn on_map_event(&self, event: &MapEvent);
}

/// Publish/subscribe hub for [`MapEvent`]s.
pub struct EventBus {
    subscribers: RwLock<Vec<Weak<dyn MapEventSubscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Register a subscriber; the bus keeps only a weak reference.
    pub fn subscribe(&self, subscriber: Arc<dyn MapEventSubscriber>) {
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }

    /// Deliver an event to all live subscribers, pruning dead ones.
    pub fn publish(&self, event: MapEvent) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_map_event(&event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
