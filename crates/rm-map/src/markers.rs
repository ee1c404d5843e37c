//! Marker handle bookkeeping
//!
//! Components never hold raw marker handles; they key markers by a logical
//! string and let [`MarkerTable`] pair each key with its current surface
//! handle. The table always removes a key's previous handle before placing
//! a replacement, so re-renders cannot leak markers.

use ahash::AHashMap;

use crate::surface::{MapSurface, MarkerId, MarkerSpec};

/// Owned key→handle map for one marker layer.
#[derive(Default)]
pub struct MarkerTable {
    handles: AHashMap<String, MarkerId>,
}

impl MarkerTable {
    pub fn new() -> Self {
        Self {
            handles: AHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<MarkerId> {
        self.handles.get(key).copied()
    }

    /// Logical key for a surface handle, if the handle belongs to this layer.
    pub fn find_key(&self, id: MarkerId) -> Option<&str> {
        self.handles
            .iter()
            .find(|(_, handle)| **handle == id)
            .map(|(key, _)| key.as_str())
    }

    /// Place a marker under `key`, removing the key's previous handle first.
    pub fn replace(&mut self, surface: &dyn MapSurface, key: &str, spec: MarkerSpec) -> MarkerId {
        if let Some(old) = self.handles.remove(key) {
            surface.remove_marker(old);
        }
        let id = surface.place_marker(spec);
        self.handles.insert(key.to_string(), id);
        id
    }

    /// Remove every marker in this layer from the surface.
    pub fn clear(&mut self, surface: &dyn MapSurface) {
        for (_, id) in self.handles.drain() {
            surface.remove_marker(id);
        }
    }

    /// Wholesale generation swap: tear down the current marker set, then
    /// place one marker per `(key, spec)` pair.
    pub fn replace_all<I>(&mut self, surface: &dyn MapSurface, generation: I)
    where
        I: IntoIterator<Item = (String, MarkerSpec)>,
    {
        self.clear(surface);
        for (key, spec) in generation {
            self.replace(surface, &key, spec);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessSurface, MarkerStyle, SurfaceOp};
    use rm_core::GeoPoint;

    fn point(lng: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lng, lat).unwrap()
    }

    fn spec(lng: f64, lat: f64) -> MarkerSpec {
        MarkerSpec::new(point(lng, lat), MarkerStyle::HomePin { badge: None })
    }

    #[test]
    fn test_replace_removes_prior_handle_first() {
        let surface = HeadlessSurface::centered(point(-99.1332, 19.4326), 11.0);
        let mut table = MarkerTable::new();

        let first = table.replace(surface.as_ref(), "a", spec(-99.1, 19.4));
        surface.take_ops();
        let second = table.replace(surface.as_ref(), "a", spec(-99.1, 19.4));

        assert_ne!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(surface.marker_count(), 1);

        let ops = surface.ops();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], SurfaceOp::RemoveMarker { id: first });
        assert!(matches!(ops[1], SurfaceOp::PlaceMarker { id, .. } if id == second));
    }

    #[test]
    fn test_replace_all_swaps_generations() {
        let surface = HeadlessSurface::centered(point(-99.1332, 19.4326), 11.0);
        let mut table = MarkerTable::new();

        table.replace_all(
            surface.as_ref(),
            vec![
                ("a".to_string(), spec(-99.1, 19.4)),
                ("b".to_string(), spec(-99.2, 19.5)),
            ],
        );
        assert_eq!(surface.marker_count(), 2);

        table.replace_all(surface.as_ref(), vec![("c".to_string(), spec(-99.3, 19.6))]);
        assert_eq!(table.len(), 1);
        assert_eq!(surface.marker_count(), 1);
        assert!(table.get("a").is_none());
        assert!(table.get("c").is_some());
    }

    #[test]
    fn test_clear_empties_surface_and_table() {
        let surface = HeadlessSurface::centered(point(-99.1332, 19.4326), 11.0);
        let mut table = MarkerTable::new();
        table.replace(surface.as_ref(), "a", spec(-99.1, 19.4));
        table.replace(surface.as_ref(), "b", spec(-99.2, 19.5));

        table.clear(surface.as_ref());

        assert!(table.is_empty());
        assert_eq!(surface.marker_count(), 0);
    }

    #[test]
    fn test_find_key_maps_handle_back() {
        let surface = HeadlessSurface::centered(point(-99.1332, 19.4326), 11.0);
        let mut table = MarkerTable::new();
        let id = table.replace(surface.as_ref(), "a", spec(-99.1, 19.4));

        assert_eq!(table.find_key(id), Some("a"));
        assert_eq!(table.find_key(MarkerId::new()), None);
    }
}
