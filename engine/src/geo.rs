//! Geo value normalization.
//!
//! Turns the plain literals found in declarative options (`[lat, lng]` pairs,
//! `[[lat, lng], [lat, lng]]` bounds, `{url, size, origin, anchor}` image
//! objects) into the typed values the mapping service consumes.
//!
//! All functions are pure. They return an error for malformed input and leave
//! it to the caller to decide whether that is fatal or only a diagnostic.

use crate::{error::Result, value, Error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// A rectangle spanned by two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }
}

/// Pixel size of an image, with an optional unit (`"px"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Pixel offset inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A custom marker icon or shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Point>,
    /// Fields this crate does not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Icon or shadow as given to a marker: a plain URL or a described image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Icon {
    Url(String),
    Image(MarkerImage),
}

/// Convert a `[lat, lng]` pair into a [`LatLng`].
pub fn to_point(coord: &Value) -> Result<LatLng> {
    let (a, b) = number_pair(coord).map_err(Error::InvalidCoordinate)?;
    Ok(LatLng::new(a, b))
}

/// Convert `[[lat, lng], [lat, lng]]` into [`LatLngBounds`].
pub fn to_bounds(pair: &Value) -> Result<LatLngBounds> {
    let corners = pair
        .as_array()
        .filter(|items| items.len() == 2)
        .ok_or_else(|| {
            Error::InvalidBounds(format!(
                "expected two coordinate pairs, got {}",
                value::kind(pair)
            ))
        })?;

    let south_west = to_point(&corners[0]).map_err(|e| Error::InvalidBounds(e.to_string()))?;
    let north_east = to_point(&corners[1]).map_err(|e| Error::InvalidBounds(e.to_string()))?;
    Ok(LatLngBounds::new(south_west, north_east))
}

/// Build a [`MarkerImage`] from a descriptor object.
///
/// `size` is `[width, height]` or `[width, height, unit]`; `origin` and `anchor`
/// are `[x, y]`. `url` is kept as is and any other key lands in `extra`.
pub fn to_image_descriptor(options: &Value) -> Result<MarkerImage> {
    let object = options.as_object().ok_or_else(|| {
        Error::InvalidPayload(format!(
            "image descriptor must be an object, got {}",
            value::kind(options)
        ))
    })?;

    let mut image = MarkerImage {
        url: None,
        size: None,
        origin: None,
        anchor: None,
        extra: Map::new(),
    };

    for (key, field) in object {
        match key.as_str() {
            "url" => match field {
                Value::String(url) => image.url = Some(url.clone()),
                other => {
                    return Err(Error::InvalidPayload(format!(
                        "image url must be a string, got {}",
                        value::kind(other)
                    )))
                }
            },
            "size" => image.size = Some(to_size(field)?),
            "origin" => image.origin = Some(to_pixel_point("origin", field)?),
            "anchor" => image.anchor = Some(to_pixel_point("anchor", field)?),
            _ => {
                image.extra.insert(key.clone(), field.clone());
            }
        }
    }

    Ok(image)
}

/// Normalize an icon/shadow option: strings stay URLs, objects become images.
pub fn to_icon(option: &Value) -> Result<Icon> {
    match option {
        Value::String(url) => Ok(Icon::Url(url.clone())),
        other => to_image_descriptor(other).map(Icon::Image),
    }
}

fn to_size(field: &Value) -> Result<Size> {
    let items = field
        .as_array()
        .filter(|items| items.len() == 2 || items.len() == 3)
        .ok_or_else(|| Error::InvalidPayload("size must be [width, height(, unit)]".into()))?;

    let (width, height) = number_pair(&Value::Array(items[..2].to_vec()))
        .map_err(|reason| Error::InvalidPayload(format!("size: {reason}")))?;
    let unit = match items.get(2) {
        None => None,
        Some(Value::String(unit)) => Some(unit.clone()),
        Some(other) => {
            return Err(Error::InvalidPayload(format!(
                "size unit must be a string, got {}",
                value::kind(other)
            )))
        }
    };

    Ok(Size {
        width,
        height,
        unit,
    })
}

fn to_pixel_point(name: &str, field: &Value) -> Result<Point> {
    let (x, y) =
        number_pair(field).map_err(|reason| Error::InvalidPayload(format!("{name}: {reason}")))?;
    Ok(Point { x, y })
}

fn number_pair(value: &Value) -> std::result::Result<(f64, f64), String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("expected [a, b], got {}", value::kind(value)))?;
    if items.len() != 2 {
        return Err(format!("expected 2 elements, got {}", items.len()));
    }
    match (items[0].as_f64(), items[1].as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(format!(
            "expected numbers, got [{}, {}]",
            value::kind(&items[0]),
            value::kind(&items[1])
        )),
    }
}
