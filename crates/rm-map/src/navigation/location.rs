//! Continuous location stream
//!
//! Platform geolocation delivers positions through registered callbacks for
//! as long as a watch is held. The trait keeps that shape so the session
//! logic is the same against real hardware and against a scripted stream.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use rm_core::GeoPoint;

use crate::error::MapError;

/// Handle for one active position watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(Uuid);

impl WatchHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WatchHandle {
    fn default() -> Self {
        Self::new()
    }
}

pub type LocationUpdateHandler = Box<dyn Fn(GeoPoint) + Send + Sync>;
pub type LocationErrorHandler = Box<dyn Fn(&MapError) + Send + Sync>;

/// Continuous position source.
pub trait LocationStream: Send + Sync {
    /// Register callbacks for position fixes and stream errors.
    ///
    /// Errs at registration when the platform has no location capability
    /// at all; errors after a successful registration arrive through
    /// `on_error` instead.
    fn watch(
        &self,
        on_update: LocationUpdateHandler,
        on_error: LocationErrorHandler,
    ) -> Result<WatchHandle, MapError>;

    /// Stop a watch. Unknown handles are ignored.
    fn cancel(&self, handle: WatchHandle);
}

struct WatchEntry {
    on_update: LocationUpdateHandler,
    on_error: LocationErrorHandler,
}

/// Stream driven by explicit pushes, for tests and the demo binary.
pub struct ScriptedLocationStream {
    watches: Mutex<AHashMap<WatchHandle, Arc<WatchEntry>>>,
    unavailable: bool,
}

impl ScriptedLocationStream {
    pub fn new() -> Self {
        Self {
            watches: Mutex::new(AHashMap::new()),
            unavailable: false,
        }
    }

    /// Stream that rejects every watch, like a platform without location
    /// support.
    pub fn unavailable() -> Self {
        Self {
            watches: Mutex::new(AHashMap::new()),
            unavailable: true,
        }
    }

    /// Deliver a position fix to every active watch.
    pub fn push(&self, point: GeoPoint) {
        for (handle, entry) in self.snapshot() {
            // A callback may cancel watches mid-delivery; skip any that
            // are gone by the time their turn comes.
            if self.watches.lock().contains_key(&handle) {
                (entry.on_update)(point);
            }
        }
    }

    /// Deliver a stream error to every active watch.
    pub fn fail(&self, error: MapError) {
        for (handle, entry) in self.snapshot() {
            if self.watches.lock().contains_key(&handle) {
                (entry.on_error)(&error);
            }
        }
    }

    pub fn active_watches(&self) -> usize {
        self.watches.lock().len()
    }

    // Callbacks run outside the lock so they may call cancel.
    fn snapshot(&self) -> Vec<(WatchHandle, Arc<WatchEntry>)> {
        self.watches
            .lock()
            .iter()
            .map(|(handle, entry)| (*handle, entry.clone()))
            .collect()
    }
}

impl Default for ScriptedLocationStream {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationStream for ScriptedLocationStream {
    fn watch(
        &self,
        on_update: LocationUpdateHandler,
        on_error: LocationErrorHandler,
    ) -> Result<WatchHandle, MapError> {
        if self.unavailable {
            return Err(MapError::LocationUnavailable(
                "platform has no location capability".to_string(),
            ));
        }
        let handle = WatchHandle::new();
        self.watches
            .lock()
            .insert(handle, Arc::new(WatchEntry { on_update, on_error }));
        Ok(handle)
    }

    fn cancel(&self, handle: WatchHandle) {
        self.watches.lock().remove(&handle);
    }
}
