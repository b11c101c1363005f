//! Operations a caller can run on a set of anchors.
//!
//! Operations are plain values, dispatched by [`crate::Goomaps::apply`]. They can
//! be built directly or parsed from a method name and a JSON argument.

use crate::events::Events;
use crate::marker::MarkerSpec;
use crate::query::Criteria;
use crate::registry::MapOptions;
use crate::{error::Result, value, Error};
use serde_json::Value;

/// Every method name [`Operation::from_name`] accepts.
pub const METHODS: &[&str] = &[
    "init",
    "update",
    "destroy",
    "setmarkers",
    "getmarkers",
    "addevents",
];

/// An operation on one or more anchors.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Create a map, replacing any existing one
    Init(MapOptions),
    /// Change center, zoom or type of the existing map
    Update(MapOptions),
    /// Drop the whole anchor, or one keyed slot of it
    Destroy(Option<String>),
    /// Append markers
    SetMarkers(Vec<MarkerSpec>),
    /// Select markers of the first anchor
    GetMarkers(Criteria),
    /// Bind listeners to the map
    AddEvents(Events),
}

impl Operation {
    /// The method name this operation is called by.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Init(_) => "init",
            Operation::Update(_) => "update",
            Operation::Destroy(_) => "destroy",
            Operation::SetMarkers(_) => "setmarkers",
            Operation::GetMarkers(_) => "getmarkers",
            Operation::AddEvents(_) => "addevents",
        }
    }

    /// Parse an operation from its method name and JSON argument.
    ///
    /// Map options never fail to parse; their bad fields are carried in
    /// [`MapOptions::rejected`]. A destroy key that is not a string, a marker
    /// batch that is neither object nor array, and event handlers are
    /// `InvalidPayload`. Event handlers are code, not data: `addevents` only
    /// accepts an empty argument here. Build [`Operation::AddEvents`] directly
    /// to bind handlers.
    pub fn from_name(name: &str, args: &Value) -> Result<Self> {
        match name {
            "init" => Ok(Operation::Init(MapOptions::from_value(args))),
            "update" => Ok(Operation::Update(MapOptions::from_value(args))),
            "destroy" => match args {
                Value::Null => Ok(Operation::Destroy(None)),
                Value::String(key) => Ok(Operation::Destroy(Some(key.clone()))),
                other => Err(Error::InvalidPayload(format!(
                    "destroy key must be a string, got {}",
                    value::kind(other)
                ))),
            },
            "setmarkers" => MarkerSpec::list_from_value(args).map(Operation::SetMarkers),
            "getmarkers" => Criteria::from_value(args).map(Operation::GetMarkers),
            "addevents" => match args {
                Value::Null => Ok(Operation::AddEvents(Events::new())),
                Value::Object(handlers) if handlers.is_empty() => {
                    Ok(Operation::AddEvents(Events::new()))
                }
                _ => Err(Error::InvalidPayload(
                    "event handlers cannot be read from JSON".into(),
                )),
            },
            unknown => Err(Error::UnknownOperation(unknown.to_string())),
        }
    }

    /// Parse a call where the method may be omitted, which means `init`.
    pub fn from_call(method: Option<&str>, args: &Value) -> Result<Self> {
        Self::from_name(method.unwrap_or("init"), args)
    }
}

impl Default for Operation {
    fn default() -> Self {
        Operation::Init(MapOptions::default())
    }
}
