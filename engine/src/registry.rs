//! State registry - per-anchor map state.
//!
//! Every anchor holds at most one [`StateRecord`]: the live map plus its marker
//! sequence. Records are created by `init`, adjusted by `update` and dropped by
//! `destroy`. Each record gets a fresh [`Generation`]; asynchronous completions
//! (address geocoding) carry the generation they were started under and are
//! discarded once the record has been replaced or destroyed.
//!
//! Anchors may also carry caller data slots next to the record.

use crate::config::Config;
use crate::events::{bind_events, Events};
use crate::geo;
use crate::geocode::GeocodeClient;
use crate::logging::diagnose;
use crate::marker::{Marker, MarkerSpec};
use crate::overlay::{self, BuildReport};
use crate::query::MarkerQuery;
use crate::service::{Document, MapHandle, MapService, MapSettings, MapTypeId};
use crate::{error::Result, value, AnchorId, Error};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

/// Slot name of the state record on an anchor.
pub const STATE_KEY: &str = "goomaps";

/// Slot name addressing only the marker sequence of the state record.
pub const MARKERS_KEY: &str = "markers";

/// Monotonic identity of a state record.
pub type Generation = u64;

type LiveTable = RefCell<HashMap<AnchorId, Generation>>;

/// Capabilities and settings an operation runs with.
pub struct Context<'a> {
    pub service: &'a dyn MapService,
    pub document: &'a dyn Document,
    pub geocoder: &'a GeocodeClient,
    pub config: &'a Config,
}

/// Declarative map options for `init` and `update`.
///
/// Parsed field by field: a malformed field is dropped and kept in
/// [`MapOptions::rejected`] so it can be reported, the others still apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    /// Turn diagnostics on for the owning facade
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    /// An address string (geocoded) or a `[lat, lng]` pair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u8>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub map_type: Option<String>,
    #[serde(skip)]
    rejected: Vec<Error>,
}

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from JSON. `null` is the empty set of options; the map type
    /// may be given as `type`, `mapTypeId` or `MapTypeId`.
    pub fn from_value(options: &Value) -> Self {
        let mut parsed = Self::default();
        let object = match options {
            Value::Null => return parsed,
            Value::Object(object) => object,
            other => {
                parsed.rejected.push(Error::InvalidPayload(format!(
                    "map options must be an object, got {}",
                    value::kind(other)
                )));
                return parsed;
            }
        };

        for (key, raw) in object {
            if raw.is_null() {
                continue;
            }
            match key.as_str() {
                "debug" => match raw.as_bool() {
                    Some(flag) => parsed.debug = Some(flag),
                    None => {
                        parsed.reject(format!("debug: expected bool, got {}", value::kind(raw)))
                    }
                },
                "center" => parsed.center = Some(raw.clone()),
                "zoom" => match zoom_level(raw) {
                    Some(zoom) => parsed.zoom = Some(zoom),
                    None => parsed.reject(format!("zoom: expected an integer 0-255, got {raw}")),
                },
                "type" | "mapTypeId" | "MapTypeId" => match raw {
                    Value::String(name) => parsed.map_type = Some(name.clone()),
                    other => parsed.rejected.push(Error::InvalidMapType(other.to_string())),
                },
                _ => {}
            }
        }
        parsed
    }

    /// Fields dropped while parsing.
    pub fn rejected(&self) -> &[Error] {
        &self.rejected
    }

    fn reject(&mut self, reason: String) {
        self.rejected.push(Error::InvalidPayload(reason));
    }

    pub fn with_center(mut self, lat: f64, lng: f64) -> Self {
        self.center = Some(serde_json::json!([lat, lng]));
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.center = Some(Value::String(address.into()));
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_map_type(mut self, map_type: MapTypeId) -> Self {
        self.map_type = Some(map_type.to_string());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }
}

/// The live map of one anchor and the markers placed on it.
pub struct StateRecord {
    map: MapHandle,
    markers: Vec<Marker>,
    generation: Generation,
}

impl StateRecord {
    pub fn map(&self) -> &MapHandle {
        &self.map
    }

    /// Markers in insertion order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl std::fmt::Debug for StateRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRecord")
            .field("anchor", &self.map.anchor())
            .field("markers", &self.markers.len())
            .field("generation", &self.generation)
            .finish()
    }
}

/// Everything stored on one anchor.
#[derive(Debug, Default)]
pub struct AnchorSlots {
    state: Option<StateRecord>,
    data: BTreeMap<String, Value>,
}

impl AnchorSlots {
    fn is_empty(&self) -> bool {
        self.state.is_none() && self.data.is_empty()
    }
}

/// An asynchronous completion tied to the record generation it started under.
#[derive(Debug, Clone)]
pub struct PendingGeocode {
    anchor: AnchorId,
    generation: Generation,
    live: Weak<LiveTable>,
}

impl PendingGeocode {
    /// Whether the record this was started for is still the anchor's record.
    pub fn is_current(&self) -> bool {
        self.live.upgrade().is_some_and(|table| {
            table.borrow().get(&self.anchor) == Some(&self.generation)
        })
    }
}

/// Per-anchor state for one facade.
#[derive(Debug, Default)]
pub struct Registry {
    anchors: HashMap<AnchorId, AnchorSlots>,
    live: Rc<LiveTable>,
    next_generation: Generation,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map on `anchor`, replacing any existing record.
    ///
    /// Returns the new record's generation. An address center resolves later;
    /// the map starts at the configured default center until then.
    pub fn init(&mut self, ctx: &Context<'_>, anchor: &str, options: &MapOptions) -> Generation {
        if self.is_initialized(anchor) {
            self.destroy(anchor, Some(STATE_KEY));
        }

        let settings = MapSettings {
            center: ctx.config.default_center,
            zoom: ctx.config.default_zoom,
            map_type: ctx.config.default_map_type,
        };
        let anchor_id: AnchorId = anchor.to_string();
        let map = ctx.service.create_map(&anchor_id, &settings);

        self.next_generation += 1;
        let generation = self.next_generation;
        self.live.borrow_mut().insert(anchor_id.clone(), generation);

        apply_options(ctx, &map, options, self.pending(anchor, generation));

        self.anchors.entry(anchor_id).or_default().state = Some(StateRecord {
            map,
            markers: Vec::new(),
            generation,
        });

        tracing::debug!(anchor, generation, "map initialized");
        generation
    }

    /// Apply center, zoom and type to the existing map of `anchor`.
    pub fn update(&mut self, ctx: &Context<'_>, anchor: &str, options: &MapOptions) -> Result<()> {
        let record = self.require(anchor)?;
        let (map, generation) = (Rc::clone(&record.map), record.generation);

        apply_options(ctx, &map, options, self.pending(anchor, generation));
        tracing::debug!(anchor, generation, "map updated");
        Ok(())
    }

    /// Remove state from `anchor`.
    ///
    /// `Some(STATE_KEY)` drops the record, `Some(MARKERS_KEY)` empties its marker
    /// sequence and any other present key drops that data slot. Without a key, or
    /// with a key that is not present, everything on the anchor is cleared.
    /// Returns whether anything was removed.
    ///
    /// Markers already on screen stay there; they just can no longer be reached.
    pub fn destroy(&mut self, anchor: &str, key: Option<&str>) -> bool {
        let Some(slots) = self.anchors.get_mut(anchor) else {
            return false;
        };

        let removed = match key {
            Some(STATE_KEY) if slots.state.is_some() => {
                slots.state = None;
                self.live.borrow_mut().remove(anchor);
                true
            }
            Some(MARKERS_KEY) if slots.state.is_some() => {
                if let Some(record) = slots.state.as_mut() {
                    record.markers.clear();
                }
                true
            }
            Some(other) if slots.data.contains_key(other) => {
                slots.data.remove(other);
                true
            }
            _ => {
                self.anchors.remove(anchor);
                self.live.borrow_mut().remove(anchor);
                tracing::debug!(anchor, "anchor cleared");
                return true;
            }
        };

        if slots.is_empty() {
            self.anchors.remove(anchor);
        }
        tracing::debug!(anchor, key, "anchor slot removed");
        removed
    }

    /// Build `specs` on the anchor's map and append the results to its markers.
    pub fn set_markers(
        &mut self,
        ctx: &Context<'_>,
        anchor: &str,
        specs: &[MarkerSpec],
    ) -> Result<BuildReport> {
        let record = self.require_mut(anchor)?;
        let (markers, report) = overlay::build_markers(ctx, &record.map, specs);
        record.markers.extend(markers);

        tracing::debug!(
            anchor,
            added = report.added,
            skipped = report.skipped.len(),
            total = record.markers.len(),
            "markers added"
        );
        Ok(report)
    }

    /// Bind `events` to the anchor's live map.
    pub fn add_events(&self, anchor: &str, events: &Events) -> Result<usize> {
        let record = self.require(anchor)?;
        Ok(bind_events(&*record.map, events))
    }

    /// Query the anchor's markers.
    pub fn query(&self, anchor: &str, config: &Config) -> Result<MarkerQuery<'_>> {
        let record = self.require(anchor)?;
        Ok(MarkerQuery::new(&record.markers, config.max_match_depth).debug(config.debug))
    }

    pub fn state(&self, anchor: &str) -> Option<&StateRecord> {
        self.anchors.get(anchor).and_then(|s| s.state.as_ref())
    }

    /// The anchor's record, or [`Error::NotInitialized`].
    pub fn require(&self, anchor: &str) -> Result<&StateRecord> {
        self.state(anchor)
            .ok_or_else(|| Error::NotInitialized(anchor.to_string()))
    }

    fn require_mut(&mut self, anchor: &str) -> Result<&mut StateRecord> {
        self.anchors
            .get_mut(anchor)
            .and_then(|s| s.state.as_mut())
            .ok_or_else(|| Error::NotInitialized(anchor.to_string()))
    }

    pub fn is_initialized(&self, anchor: &str) -> bool {
        self.state(anchor).is_some()
    }

    /// Store caller data on `anchor` under `key`.
    pub fn set_data(&mut self, anchor: &str, key: &str, data: Value) -> Result<()> {
        if key == STATE_KEY || key == MARKERS_KEY {
            return Err(Error::InvalidPayload(format!("'{key}' is a reserved slot")));
        }
        self.anchors
            .entry(anchor.to_string())
            .or_default()
            .data
            .insert(key.to_string(), data);
        Ok(())
    }

    pub fn data(&self, anchor: &str, key: &str) -> Option<&Value> {
        self.anchors.get(anchor).and_then(|s| s.data.get(key))
    }

    /// Number of anchors holding a state record.
    pub fn len(&self) -> usize {
        self.anchors.values().filter(|s| s.state.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pending(&self, anchor: &str, generation: Generation) -> PendingGeocode {
        PendingGeocode {
            anchor: anchor.to_string(),
            generation,
            live: Rc::downgrade(&self.live),
        }
    }
}

/// Integral zoom in `u8` range. Whole floats such as `13.0` count.
fn zoom_level(raw: &Value) -> Option<u8> {
    if let Some(zoom) = raw.as_u64() {
        return u8::try_from(zoom).ok();
    }
    raw.as_f64()
        .filter(|zoom| zoom.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(zoom))
        .map(|zoom| zoom as u8)
}

fn apply_options(ctx: &Context<'_>, map: &MapHandle, options: &MapOptions, pending: PendingGeocode) {
    let debug = ctx.config.debug;

    for rejected in options.rejected() {
        diagnose(debug, rejected);
    }

    match &options.center {
        None => {}
        Some(center) if !value::is_truthy(center) => {}
        Some(Value::String(address)) => {
            let target = Rc::downgrade(map);
            let result = ctx.geocoder.geocode(address, debug, move |location| {
                if !pending.is_current() {
                    tracing::debug!(
                        anchor = %pending.anchor,
                        generation = pending.generation,
                        "discarding geocode for a replaced map"
                    );
                    return;
                }
                if let Some(map) = target.upgrade() {
                    map.set_center(location);
                }
            });
            if let Err(e) = result {
                diagnose(debug, &e);
            }
        }
        Some(center @ Value::Array(_)) => match geo::to_point(center) {
            Ok(point) => map.set_center(point),
            Err(e) => diagnose(debug, &Error::InvalidCenter(e.to_string())),
        },
        Some(other) => diagnose(
            debug,
            &Error::InvalidCenter(format!(
                "must be either an array or a string, got {}",
                value::kind(other)
            )),
        ),
    }

    if let Some(zoom) = options.zoom {
        map.set_zoom(zoom);
    }

    if let Some(name) = &options.map_type {
        match name.parse::<MapTypeId>() {
            Ok(map_type) => map.set_map_type(map_type),
            Err(e) => diagnose(debug, &e),
        }
    }
}
