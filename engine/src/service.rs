//! Capabilities the engine drives but does not implement.
//!
//! A [`MapService`] constructs live maps, markers, info windows and the geocoder.
//! Live objects are shared, interior-mutable handles (the engine runs on a single
//! event loop), so every setter takes `&self`. A [`Document`] resolves `#selector`
//! references used for info window content.
//!
//! [`crate::headless`] provides an in-memory implementation of both.

use crate::events::EventCallback;
use crate::geo::LatLng;
use crate::geocode::Geocoder;
use crate::marker::MarkerOptions;
use crate::{AnchorId, Error};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::str::FromStr;

/// Base map styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapTypeId {
    #[default]
    Roadmap,
    Satellite,
    Hybrid,
    Terrain,
}

impl std::fmt::Display for MapTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapTypeId::Roadmap => write!(f, "roadmap"),
            MapTypeId::Satellite => write!(f, "satellite"),
            MapTypeId::Hybrid => write!(f, "hybrid"),
            MapTypeId::Terrain => write!(f, "terrain"),
        }
    }
}

impl FromStr for MapTypeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "roadmap" => Ok(MapTypeId::Roadmap),
            "satellite" => Ok(MapTypeId::Satellite),
            "hybrid" => Ok(MapTypeId::Hybrid),
            "terrain" => Ok(MapTypeId::Terrain),
            _ => Err(Error::InvalidMapType(s.to_string())),
        }
    }
}

/// Fully resolved settings a map is created with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    pub center: LatLng,
    pub zoom: u8,
    pub map_type: MapTypeId,
}

/// Anything listeners can be attached to.
pub trait Evented {
    /// Register `callback` for `event`. Listeners for one event run in
    /// registration order.
    fn add_listener(&self, event: &str, callback: EventCallback);

    /// Fire `event` as if the user had caused it.
    fn trigger(&self, event: &str);
}

/// A live map bound to an anchor.
pub trait LiveMap: Evented {
    fn anchor(&self) -> &str;
    fn center(&self) -> LatLng;
    fn set_center(&self, center: LatLng);
    fn zoom(&self) -> u8;
    fn set_zoom(&self, zoom: u8);
    fn map_type(&self) -> MapTypeId;
    fn set_map_type(&self, map_type: MapTypeId);
}

/// A live marker shown on a map.
pub trait LiveMarker: Evented {
    /// Current position; may differ from the creation position after a drag.
    fn position(&self) -> LatLng;
    fn set_position(&self, position: LatLng);
    fn options(&self) -> &MarkerOptions;
}

/// A popup attached to a marker.
pub trait LiveInfoWindow {
    fn content(&self) -> String;
    fn open(&self, map: &MapHandle, marker: &MarkerHandle);
    fn is_open(&self) -> bool;
}

pub type MapHandle = Rc<dyn LiveMap>;
pub type MarkerHandle = Rc<dyn LiveMarker>;
pub type InfoWindowHandle = Rc<dyn LiveInfoWindow>;

/// Factory for live objects.
pub trait MapService {
    fn create_map(&self, anchor: &AnchorId, settings: &MapSettings) -> MapHandle;

    /// Create a marker on `map`. `options.position` is already normalized.
    fn create_marker(&self, map: &MapHandle, options: &MarkerOptions) -> MarkerHandle;

    fn create_info_window(&self, content: &str) -> InfoWindowHandle;

    /// Called at most once per [`crate::Goomaps`] facade, on first geocode.
    fn create_geocoder(&self) -> Rc<dyn Geocoder>;
}

/// Selector lookup for content referenced as `#id`.
pub trait Document {
    /// Rendered inner markup of the element matching `selector`.
    fn inner_html(&self, selector: &str) -> Option<String>;

    fn hide(&self, selector: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_type_parses_case_insensitively() {
        assert_eq!("roadmap".parse::<MapTypeId>().unwrap(), MapTypeId::Roadmap);
        assert_eq!("SATELLITE".parse::<MapTypeId>().unwrap(), MapTypeId::Satellite);
        assert_eq!(" Terrain ".parse::<MapTypeId>().unwrap(), MapTypeId::Terrain);
        assert_eq!(
            "moon".parse::<MapTypeId>(),
            Err(Error::InvalidMapType("moon".into()))
        );
    }

    #[test]
    fn map_type_display_round_trips() {
        for map_type in [
            MapTypeId::Roadmap,
            MapTypeId::Satellite,
            MapTypeId::Hybrid,
            MapTypeId::Terrain,
        ] {
            assert_eq!(map_type.to_string().parse::<MapTypeId>().unwrap(), map_type);
        }
    }
}
