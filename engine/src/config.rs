//! Engine configuration.

use crate::geo::LatLng;
use crate::service::MapTypeId;
use std::env;

/// Plugin version reported to hosts.
pub const PLUGIN_VERSION: &str = "1.0";

/// Mapping API version the capability traits are modelled on.
pub const API_VERSION: &str = "3.4";

/// Configuration owned by one [`crate::Goomaps`] facade.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Emit diagnostics for malformed input and failed lookups at `warn`
    pub debug: bool,
    /// Center a new map starts with before options are applied
    pub default_center: LatLng,
    /// Zoom a new map starts with
    pub default_zoom: u8,
    /// Map type a new map starts with
    pub default_map_type: MapTypeId,
    /// Deepest nesting the subset matcher will follow
    pub max_match_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            default_center: LatLng::new(0.0, 0.0),
            default_zoom: 10,
            default_map_type: MapTypeId::Roadmap,
            max_match_depth: 32,
        }
    }
}

impl Config {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load configuration from `GOOMAPS_*` environment variables, falling back
    /// to the defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("GOOMAPS_DEBUG") {
            config.debug = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => return Err(ConfigError::InvalidDebug(raw.clone())),
            };
        }

        if let Some(raw) = lookup("GOOMAPS_ZOOM") {
            config.default_zoom = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidZoom(raw.clone()))?;
        }

        if let Some(raw) = lookup("GOOMAPS_MAP_TYPE") {
            config.default_map_type = raw
                .parse()
                .map_err(|_| ConfigError::InvalidMapType(raw.clone()))?;
        }

        if let Some(raw) = lookup("GOOMAPS_CENTER") {
            config.default_center =
                parse_center(&raw).ok_or_else(|| ConfigError::InvalidCenter(raw.clone()))?;
        }

        if let Some(raw) = lookup("GOOMAPS_MATCH_DEPTH") {
            config.max_match_depth = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidMatchDepth(raw.clone()))?;
        }

        Ok(config)
    }
}

fn parse_center(raw: &str) -> Option<LatLng> {
    let (lat, lng) = raw.split_once(',')?;
    Some(LatLng::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?))
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid GOOMAPS_DEBUG value: {0}")]
    InvalidDebug(String),

    #[error("invalid GOOMAPS_ZOOM value: {0}")]
    InvalidZoom(String),

    #[error("invalid GOOMAPS_MAP_TYPE value: {0}")]
    InvalidMapType(String),

    #[error("invalid GOOMAPS_CENTER value (expected \"lat,lng\"): {0}")]
    InvalidCenter(String),

    #[error("invalid GOOMAPS_MATCH_DEPTH value: {0}")]
    InvalidMatchDepth(String),
}
