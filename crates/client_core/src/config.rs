use std::{fs, path::Path};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use shared::domain::{parse_finite, Coordinate};
use tracing::warn;
use url::Url;

use crate::map_sync::{MapSettings, DEFAULT_CENTER, DEFAULT_ZOOM, FOCUS_ZOOM, OSM_TILE_SOURCE};

pub const DEFAULT_CONFIG_FILE: &str = "fwi_client.toml";
pub const DEFAULT_PREDICTION_ENDPOINT: &str = "http://127.0.0.1:5000/predict";

#[derive(Debug, Clone, PartialEq)]
pub enum GeolocationSource {
    Unavailable,
    Fixed(Coordinate),
    Http { url: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub prediction_endpoint: String,
    pub tile_source: String,
    pub default_center: Coordinate,
    pub default_zoom: u8,
    pub focus_zoom: u8,
    pub geolocation: GeolocationSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prediction_endpoint: DEFAULT_PREDICTION_ENDPOINT.into(),
            tile_source: OSM_TILE_SOURCE.into(),
            default_center: DEFAULT_CENTER,
            default_zoom: DEFAULT_ZOOM,
            focus_zoom: FOCUS_ZOOM,
            geolocation: GeolocationSource::Unavailable,
        }
    }
}

impl Settings {
    pub fn map_settings(&self) -> MapSettings {
        MapSettings {
            default_center: self.default_center,
            default_zoom: self.default_zoom,
            focus_zoom: self.focus_zoom,
            tile_source: self.tile_source.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    prediction_endpoint: Option<String>,
    tile_source: Option<String>,
    default_center: Option<String>,
    default_zoom: Option<u8>,
    focus_zoom: Option<u8>,
    geolocation: Option<String>,
    fixed_location: Option<String>,
    geolocation_url: Option<String>,
}

/// Raw geolocation knobs gathered from file and environment before they are resolved.
#[derive(Debug, Default)]
struct GeolocationKnobs {
    mode: Option<String>,
    fixed_location: Option<String>,
    url: Option<String>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE))
}

/// Defaults, then the TOML file at `path` (if readable), then environment variables.
pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();
    let mut knobs = GeolocationKnobs::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, &mut knobs, file_cfg),
            Err(err) => warn!(path = %path.display(), "ignoring unparsable config file: {err}"),
        }
    }

    apply_env_overrides(&mut settings, &mut knobs, |name| std::env::var(name).ok());
    settings.geolocation = resolve_geolocation(knobs);
    settings
}

fn apply_file_settings(settings: &mut Settings, knobs: &mut GeolocationKnobs, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.prediction_endpoint {
        set_endpoint(settings, &v);
    }
    if let Some(v) = file_cfg.tile_source {
        settings.tile_source = v;
    }
    if let Some(v) = file_cfg.default_center {
        set_default_center(settings, &v);
    }
    if let Some(v) = file_cfg.default_zoom {
        settings.default_zoom = v;
    }
    if let Some(v) = file_cfg.focus_zoom {
        settings.focus_zoom = v;
    }
    knobs.mode = file_cfg.geolocation;
    knobs.fixed_location = file_cfg.fixed_location;
    knobs.url = file_cfg.geolocation_url;
}

fn apply_env_overrides(
    settings: &mut Settings,
    knobs: &mut GeolocationKnobs,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("FWI_PREDICTION_ENDPOINT") {
        set_endpoint(settings, &v);
    }
    if let Some(v) = lookup("APP__PREDICTION_ENDPOINT") {
        set_endpoint(settings, &v);
    }
    if let Some(v) = lookup("FWI_TILE_SOURCE") {
        settings.tile_source = v;
    }
    if let Some(v) = lookup("FWI_GEOLOCATION") {
        knobs.mode = Some(v);
    }
    if let Some(v) = lookup("FWI_FIXED_LOCATION") {
        knobs.fixed_location = Some(v);
    }
    if let Some(v) = lookup("FWI_GEOLOCATION_URL") {
        knobs.url = Some(v);
    }
}

fn set_endpoint(settings: &mut Settings, raw: &str) {
    match normalize_endpoint(raw) {
        Ok(endpoint) => settings.prediction_endpoint = endpoint,
        Err(err) => warn!("keeping prediction endpoint {}: {err:#}", settings.prediction_endpoint),
    }
}

fn set_default_center(settings: &mut Settings, raw: &str) {
    match parse_location(raw) {
        Some(center) => settings.default_center = center,
        None => warn!(value = raw, "ignoring invalid default_center"),
    }
}

fn resolve_geolocation(knobs: GeolocationKnobs) -> GeolocationSource {
    let mode = knobs
        .mode
        .as_deref()
        .map(|mode| mode.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "none".to_string());

    match mode.as_str() {
        "fixed" => match knobs.fixed_location.as_deref().and_then(parse_location) {
            Some(position) => GeolocationSource::Fixed(position),
            None => {
                warn!("geolocation = fixed needs fixed_location = \"<lat>,<lon>\"; disabling");
                GeolocationSource::Unavailable
            }
        },
        "http" => match knobs.url.as_deref().map(normalize_endpoint) {
            Some(Ok(url)) => GeolocationSource::Http { url },
            Some(Err(err)) => {
                warn!("invalid geolocation_url, disabling geolocation: {err:#}");
                GeolocationSource::Unavailable
            }
            None => {
                warn!("geolocation = http needs geolocation_url; disabling");
                GeolocationSource::Unavailable
            }
        },
        "none" | "" => GeolocationSource::Unavailable,
        other => {
            warn!(mode = other, "unknown geolocation mode; disabling");
            GeolocationSource::Unavailable
        }
    }
}

/// Parses `"<lat>,<lon>"`.
pub fn parse_location(raw: &str) -> Option<Coordinate> {
    let (latitude, longitude) = raw.split_once(',')?;
    let latitude = parse_finite(latitude)?;
    let longitude = parse_finite(longitude)?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some(Coordinate::new(latitude, longitude))
}

pub fn normalize_endpoint(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let url = Url::parse(raw).with_context(|| format!("'{raw}' is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("'{raw}' must use http or https"));
    }
    Ok(url.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
