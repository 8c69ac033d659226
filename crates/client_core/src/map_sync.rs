//! Keeps the map display in step with the form's coordinate pair.

use std::f64::consts::PI;

use shared::domain::Coordinate;
use tracing::debug;

/// Geographic centroid of India, shown until a valid coordinate is entered.
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(20.5937, 78.9629);
pub const DEFAULT_ZOOM: u8 = 5;
pub const FOCUS_ZOOM: u8 = 12;
pub const OSM_TILE_SOURCE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;
const TILE_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub default_center: Coordinate,
    pub default_zoom: u8,
    pub focus_zoom: u8,
    pub tile_source: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            default_center: DEFAULT_CENTER,
            default_zoom: DEFAULT_ZOOM,
            focus_zoom: FOCUS_ZOOM,
            tile_source: OSM_TILE_SOURCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTransition {
    Immediate,
    Animated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub position: Coordinate,
    pub label: String,
}

/// The map widget capability: it only ever receives new values for these fields.
pub trait MapDisplay {
    fn set_view(&mut self, center: Coordinate, zoom: u8, transition: ViewTransition);
    fn set_markers(&mut self, markers: Vec<MapMarker>);
}

/// In-memory map widget state, rendered by the desktop map panel.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
    pub tile_source: String,
    pub markers: Vec<MapMarker>,
    pub transition: ViewTransition,
}

impl MapView {
    pub fn new(settings: &MapSettings) -> Self {
        Self {
            center: settings.default_center,
            zoom: settings.default_zoom,
            tile_source: settings.tile_source.clone(),
            markers: Vec::new(),
            transition: ViewTransition::Immediate,
        }
    }

    pub fn center_tile(&self) -> TileId {
        TileId::containing(self.center, self.zoom)
    }

    pub fn center_tile_url(&self) -> String {
        self.center_tile().url(&self.tile_source)
    }
}

impl MapDisplay for MapView {
    fn set_view(&mut self, center: Coordinate, zoom: u8, transition: ViewTransition) {
        self.center = center;
        self.zoom = zoom;
        self.transition = transition;
    }

    fn set_markers(&mut self, markers: Vec<MapMarker>) {
        self.markers = markers;
    }
}

/// Web-mercator slippy-map tile index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn containing(position: Coordinate, zoom: u8) -> Self {
        let tiles = 2f64.powi(i32::from(zoom));
        let max_index = tiles - 1.0;
        let latitude = position
            .latitude
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();
        let x = ((position.longitude + 180.0) / 360.0 * tiles)
            .floor()
            .clamp(0.0, max_index);
        let y = ((1.0 - (latitude.tan() + 1.0 / latitude.cos()).ln() / PI) / 2.0 * tiles)
            .floor()
            .clamp(0.0, max_index);
        Self {
            zoom,
            x: x as u32,
            y: y as u32,
        }
    }

    /// Expands `{s}`, `{z}`, `{x}` and `{y}` in a tile URL template.
    pub fn url(&self, template: &str) -> String {
        let subdomain = TILE_SUBDOMAINS[((self.x + self.y) % 3) as usize];
        template
            .replace("{s}", subdomain)
            .replace("{z}", &self.zoom.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

pub fn marker_label(latitude: &str, longitude: &str) -> String {
    format!(
        "Selected Location\nLat: {}\nLon: {}",
        latitude.trim(),
        longitude.trim()
    )
}

/// Derives center, zoom and marker from the coordinate pair and pushes them to the display.
pub struct MapSynchronizer<D> {
    display: D,
    settings: MapSettings,
    last_pair: (String, String),
    focused: Option<Coordinate>,
}

impl<D: MapDisplay> MapSynchronizer<D> {
    pub fn new(mut display: D, settings: MapSettings) -> Self {
        display.set_view(
            settings.default_center,
            settings.default_zoom,
            ViewTransition::Immediate,
        );
        display.set_markers(Vec::new());
        Self {
            display,
            settings,
            last_pair: (String::new(), String::new()),
            focused: None,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// Entry point for coordinate writes. Returns whether the map was recentered.
    pub fn coordinates_changed(&mut self, latitude: &str, longitude: &str) -> bool {
        if self.last_pair.0 == latitude && self.last_pair.1 == longitude {
            return false;
        }
        self.last_pair = (latitude.to_string(), longitude.to_string());

        let previous = self.focused;
        self.focused = Coordinate::parse(latitude, longitude);

        match self.focused {
            Some(position) => {
                let moved = previous != Some(position);
                if moved {
                    debug!(
                        latitude = position.latitude,
                        longitude = position.longitude,
                        "recentering map"
                    );
                    self.display.set_view(
                        position,
                        self.settings.focus_zoom,
                        ViewTransition::Animated,
                    );
                }
                self.display.set_markers(vec![MapMarker {
                    position,
                    label: marker_label(latitude, longitude),
                }]);
                moved
            }
            None if previous.is_some() => {
                debug!("coordinates cleared; showing default map view");
                self.display.set_view(
                    self.settings.default_center,
                    self.settings.default_zoom,
                    ViewTransition::Immediate,
                );
                self.display.set_markers(Vec::new());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/map_sync_tests.rs"]
mod tests;
