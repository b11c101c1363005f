//! Marker specs and stored markers.
//!
//! A [`MarkerSpec`] is what the caller writes: a declarative `options` object plus
//! an [`Events`] table. [`MarkerOptions`] is the normalized form handed to the
//! mapping service. A [`Marker`] is what the registry keeps: the live overlay, the
//! normalized options and the caller's original options object, which is what
//! subset queries match against.

use crate::events::Events;
use crate::geo::{self, Icon, LatLng};
use crate::service::{InfoWindowHandle, MarkerHandle};
use crate::{error::Result, value, Error};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Info window body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoContent {
    /// `#id` reference to existing content in the document
    Selector(String),
    /// Literal body text or markup
    Text(String),
}

/// Normalized marker options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerOptions {
    pub position: LatLng,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Icon>,
    pub clickable: bool,
    pub draggable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<InfoContent>,
    pub initial_open: bool,
    /// Caller-chosen identifier, always a string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MarkerOptions {
    /// Options for a plain marker at `position`.
    pub fn at(position: LatLng) -> Self {
        Self {
            position,
            title: None,
            icon: None,
            shadow: None,
            clickable: true,
            draggable: false,
            info: None,
            initial_open: false,
            uid: None,
            data: None,
        }
    }

    /// Normalize the declarative options of the spec at `index`.
    ///
    /// A missing or malformed `position` (or a non-object `options`) is an error:
    /// the marker cannot be built. Problems with optional fields come back as
    /// warnings and the field is left unset.
    pub fn parse(index: usize, options: &Value) -> Result<(Self, Vec<Error>)> {
        let object = options.as_object().ok_or_else(|| Error::InvalidMarker {
            index,
            reason: format!("options must be an object, got {}", value::kind(options)),
        })?;

        let position = match object.get("position") {
            None | Some(Value::Null) => return Err(Error::MissingPosition { index }),
            Some(raw) => geo::to_point(raw).map_err(|e| Error::InvalidMarker {
                index,
                reason: e.to_string(),
            })?,
        };

        let mut parsed = Self::at(position);
        let mut warnings = Vec::new();
        let mut warn = |field: &str, reason: String| {
            warnings.push(Error::InvalidMarker {
                index,
                reason: format!("{field}: {reason}"),
            })
        };

        for (key, raw) in object {
            match key.as_str() {
                "title" => match raw {
                    Value::String(title) => parsed.title = Some(title.clone()),
                    Value::Null => {}
                    other => warn("title", format!("expected string, got {}", value::kind(other))),
                },
                "icon" | "shadow" if value::is_truthy(raw) => match geo::to_icon(raw) {
                    Ok(icon) if key == "icon" => parsed.icon = Some(icon),
                    Ok(icon) => parsed.shadow = Some(icon),
                    Err(e) => warn(key.as_str(), e.to_string()),
                },
                "clickable" => match raw.as_bool() {
                    Some(flag) => parsed.clickable = flag,
                    None => warn("clickable", format!("expected bool, got {}", value::kind(raw))),
                },
                "draggable" => match raw.as_bool() {
                    Some(flag) => parsed.draggable = flag,
                    None => warn("draggable", format!("expected bool, got {}", value::kind(raw))),
                },
                "info" if value::is_truthy(raw) => {
                    parsed.info = Some(match raw {
                        Value::String(s) if s.starts_with('#') => InfoContent::Selector(s.clone()),
                        Value::String(s) => InfoContent::Text(s.clone()),
                        other => InfoContent::Text(other.to_string()),
                    })
                }
                "initialopen" => parsed.initial_open = value::loose_eq(raw, &Value::Bool(true)),
                "uid" => match raw {
                    Value::String(uid) if !uid.is_empty() => parsed.uid = Some(uid.clone()),
                    Value::String(_) | Value::Null => {}
                    other => warn(
                        "uid",
                        format!("must be a string, got {} (stringify numeric ids)", value::kind(other)),
                    ),
                },
                "data" => parsed.data = Some(raw.clone()),
                _ => {}
            }
        }

        Ok((parsed, warnings))
    }
}

/// A marker as the caller describes it.
#[derive(Debug, Clone, Default)]
pub struct MarkerSpec {
    /// Declarative options: `position`, `title`, `icon`, `uid`, `data`, ...
    pub options: Value,
    pub events: Events,
}

impl MarkerSpec {
    pub fn new(options: Value) -> Self {
        Self {
            options,
            events: Events::new(),
        }
    }

    pub fn with_events(mut self, events: Events) -> Self {
        self.events = events;
        self
    }

    /// Read one `{"options": {...}}` spec. Anything without an `options` object is
    /// kept as is and rejected when the marker is built.
    pub fn from_value(spec: &Value) -> Self {
        Self::new(spec.get("options").cloned().unwrap_or(Value::Null))
    }

    /// Read a single spec object or an array of them. `null` is an empty list.
    pub fn list_from_value(specs: &Value) -> Result<Vec<Self>> {
        match specs {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => Ok(items.iter().map(Self::from_value).collect()),
            Value::Object(_) => Ok(vec![Self::from_value(specs)]),
            other => Err(Error::InvalidPayload(format!(
                "markers must be an object or an array, got {}",
                value::kind(other)
            ))),
        }
    }
}

impl From<MarkerSpec> for Vec<MarkerSpec> {
    fn from(spec: MarkerSpec) -> Self {
        vec![spec]
    }
}

/// A live marker held by the registry.
#[derive(Clone)]
pub struct Marker {
    overlay: MarkerHandle,
    options: MarkerOptions,
    attributes: Value,
    info_window: Option<InfoWindowHandle>,
}

impl Marker {
    pub(crate) fn new(
        overlay: MarkerHandle,
        options: MarkerOptions,
        attributes: Value,
        info_window: Option<InfoWindowHandle>,
    ) -> Self {
        Self {
            overlay,
            options,
            attributes,
            info_window,
        }
    }

    pub fn overlay(&self) -> &MarkerHandle {
        &self.overlay
    }

    pub fn options(&self) -> &MarkerOptions {
        &self.options
    }

    /// The declarative options object exactly as the caller supplied it.
    pub fn attributes(&self) -> &Value {
        &self.attributes
    }

    pub fn uid(&self) -> Option<&str> {
        self.options.uid.as_deref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.options.data.as_ref()
    }

    /// Live position, which follows drags.
    pub fn position(&self) -> LatLng {
        self.overlay.position()
    }

    pub fn info_window(&self) -> Option<&InfoWindowHandle> {
        self.info_window.as_ref()
    }

    /// Simulate a user click.
    pub fn click(&self) {
        self.overlay.trigger("click");
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("uid", &self.uid())
            .field("position", &self.position())
            .field("attributes", &self.attributes)
            .field("info_window", &self.info_window.is_some())
            .finish()
    }
}
