//! Listing marker aggregation
//!
//! Listings often share an exact coordinate (several rooms in one building),
//! so rendering one pin per listing would stack identical markers. Grouping
//! happens over the canonical coordinate key; distinct keys keep first-seen
//! order and members keep input order, which fixes both the pin stacking
//! order and the order entries appear in a popup.

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::debug;

use rm_core::settings::PopupSettings;
use rm_core::{GeoBounds, GeoPoint, MapSettings};
use rm_data::Listing;

use crate::markers::MarkerTable;
use crate::surface::{MapSurface, MarkerId, MarkerSpec, MarkerStyle, PopupContent, PopupEntry};

/// One or more listings sharing an exact coordinate, rendered as one pin.
#[derive(Debug, Clone)]
pub struct MarkerGroup {
    pub key: String,
    pub coords: GeoPoint,

    /// Members in input order
    pub listings: Vec<Listing>,
}

impl MarkerGroup {
    pub fn is_multi(&self) -> bool {
        self.listings.len() > 1
    }
}

/// Group listings by identical coordinates, preserving first-seen key order.
///
/// Listings without a usable coordinate contribute nothing; that is routine
/// data quality, not an error.
pub fn group_listings(listings: &[Listing]) -> Vec<MarkerGroup> {
    let mut groups: IndexMap<String, MarkerGroup> = IndexMap::new();
    for listing in listings {
        let Some(coords) = listing.position() else {
            debug!(listing = listing.id, "skipping listing without usable coordinates");
            continue;
        };
        match groups.entry(coords.key()) {
            Entry::Occupied(mut entry) => entry.get_mut().listings.push(listing.clone()),
            Entry::Vacant(entry) => {
                let key = entry.key().clone();
                entry.insert(MarkerGroup {
                    key,
                    coords,
                    listings: vec![listing.clone()],
                });
            }
        }
    }
    groups.into_values().collect()
}

/// Monthly price label, e.g. `$7,200/mes`.
pub fn format_price(price: f64) -> String {
    let whole = price.round().abs() as u64;
    format!("${}/mes", group_thousands(whole))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*b as char);
    }
    out
}

/// Popup body for a group: up to `max_entries` listings, plus the count of
/// what the cap hid. Entries beyond the cap are counted, never silently
/// dropped.
pub fn popup_content(group: &MarkerGroup, settings: &PopupSettings) -> PopupContent {
    let fallback = if group.is_multi() { "Depto" } else { "Departamento" };
    let entries = group
        .listings
        .iter()
        .take(settings.max_entries)
        .map(|listing| PopupEntry {
            listing_id: listing.id,
            name: if listing.name.is_empty() {
                fallback.to_string()
            } else {
                listing.name.clone()
            },
            price: format_price(listing.price),
        })
        .collect();
    PopupContent {
        entries,
        more: group.listings.len().saturating_sub(settings.max_entries),
    }
}

/// Owns the current marker generation for the listing layer.
pub struct CoordinateAggregator {
    settings: MapSettings,
    table: MarkerTable,
    groups: Vec<MarkerGroup>,
}

impl CoordinateAggregator {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings,
            table: MarkerTable::new(),
            groups: Vec::new(),
        }
    }

    /// Rebuild the whole marker generation from `listings`.
    ///
    /// The previous generation is removed from the surface before the new
    /// one is placed. With at least one group the camera is fitted to the
    /// union bounds; an empty set clears the markers and leaves the camera
    /// alone. Returns the group count.
    pub fn render(&mut self, surface: &dyn MapSurface, listings: &[Listing]) -> usize {
        self.groups = group_listings(listings);

        let generation: Vec<(String, MarkerSpec)> = self
            .groups
            .iter()
            .map(|group| (group.key.clone(), self.marker_spec(group)))
            .collect();
        self.table.replace_all(surface, generation);

        if let Some(bounds) = GeoBounds::from_points(self.groups.iter().map(|g| g.coords)) {
            surface.fit_bounds(
                bounds,
                self.settings.camera.fit_padding,
                self.settings.camera.fit_max_zoom,
            );
        }

        debug!(
            groups = self.groups.len(),
            listings = listings.len(),
            "listing markers rebuilt"
        );
        self.groups.len()
    }

    fn marker_spec(&self, group: &MarkerGroup) -> MarkerSpec {
        let count = group.listings.len();
        let mut spec = MarkerSpec::new(
            group.coords,
            MarkerStyle::HomePin {
                badge: group.is_multi().then_some(count),
            },
        )
        .with_popup(popup_content(group, &self.settings.popup));
        if group.is_multi() {
            spec = spec.with_title(format!("{count} propiedades en esta ubicación"));
        }
        spec
    }

    /// Marker-click behavior: ease toward the group and toggle its popup.
    ///
    /// Multi-listing groups zoom in deeper than single ones so overlapping
    /// pins disambiguate; both targets clamp to the surface ceiling.
    pub fn click(&self, surface: &dyn MapSurface, marker: MarkerId) {
        let Some(key) = self.table.find_key(marker) else {
            return;
        };
        let Some(group) = self.groups.iter().find(|g| g.key == key) else {
            return;
        };
        let zoom = self
            .settings
            .click_zoom
            .target(surface.viewport().zoom, group.is_multi());
        surface.ease_to(group.coords, zoom);
        surface.toggle_popup(marker);
    }

    /// Current generation in render order.
    pub fn groups(&self) -> &[MarkerGroup] {
        &self.groups
    }

    pub fn marker_count(&self) -> usize {
        self.table.len()
    }

    /// Drop the current generation from the surface.
    pub fn clear(&mut self, surface: &dyn MapSurface) {
        self.table.clear(surface);
        self.groups.clear();
    }
}
