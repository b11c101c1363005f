//! # Goomaps Engine
//!
//! Declarative maps and a content-addressable marker registry.
//!
//! Callers describe a map (center, zoom, type) and its markers (position, info
//! window, events, caller metadata) as plain nested data. The engine turns that
//! into live objects through a mapping capability and keeps them per anchor so
//! they can be found again by index, position, `uid` or partial content.
//!
//! ## Design Principles
//!
//! - **Capabilities, not platforms**: rendering, geocoding and the document are
//!   traits ([`MapService`], [`Geocoder`], [`Document`]); [`headless`] implements
//!   them in memory
//! - **Best effort with diagnostics**: a malformed marker or center is skipped and
//!   reported, never fatal; operating on an anchor without a map always fails
//! - **Single event loop**: live objects are `Rc` handles with interior mutability
//!
//! ## Core Concepts
//!
//! ### Anchors and state records
//!
//! An anchor (an element id, typically) owns at most one [`StateRecord`]: the live
//! map and its markers in insertion order. `init` replaces it, `update` adjusts it
//! and `destroy` drops it.
//!
//! ### Operations
//!
//! [`Operation`] is the closed set of calls: `Init`, `Update`, `Destroy`,
//! `SetMarkers`, `GetMarkers`, `AddEvents`. [`Goomaps::apply`] runs one over a
//! collection of anchors; [`Goomaps::call`] parses one from a method name first.
//!
//! ### Selection
//!
//! [`Criteria`] picks markers: everything, an index, an exact position, a `uid`, or
//! every marker whose options contain a given (nested) object.
//!
//! ## Quick Start
//!
//! ```rust
//! use goomaps_engine::headless::{HeadlessDocument, HeadlessService};
//! use goomaps_engine::{Config, Criteria, Goomaps, MapOptions, MarkerSpec};
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let service = Rc::new(HeadlessService::new());
//! let mut goomaps = Goomaps::new(service, Rc::new(HeadlessDocument::new()), Config::default());
//!
//! // 1. Create a map
//! goomaps
//!     .init(&["map"], &MapOptions::new().with_center(52.257, 0.055).with_zoom(13))
//!     .unwrap();
//!
//! // 2. Add markers
//! let report = goomaps
//!     .set_markers(
//!         &["map"],
//!         &[
//!             MarkerSpec::new(json!({"position": [52.257, 0.055], "uid": "id_0815"})),
//!             MarkerSpec::new(json!({"position": [52.2, 0.1], "data": {"hello": "world"}})),
//!         ],
//!     )
//!     .unwrap();
//! assert_eq!(report.added, 2);
//!
//! // 3. Find them again
//! let found = goomaps
//!     .get_markers(&["map"], &Criteria::Subset(json!({"data": {"hello": "world"}})))
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod geocode;
pub mod goomaps;
pub mod headless;
pub mod logging;
pub mod marker;
pub mod operation;
pub mod overlay;
pub mod query;
pub mod registry;
pub mod service;
pub mod value;

// Re-export main types at crate root
pub use config::{Config, ConfigError, API_VERSION, PLUGIN_VERSION};
pub use error::{Error, Result};
pub use events::{bind_events, Event, EventCallback, Events};
pub use geo::{Icon, LatLng, LatLngBounds, MarkerImage, Point, Size};
pub use geocode::{GeocodeClient, GeocodeStatus, Geocoder};
pub use goomaps::{Goomaps, Outcome};
pub use marker::{InfoContent, Marker, MarkerOptions, MarkerSpec};
pub use operation::Operation;
pub use overlay::BuildReport;
pub use query::{Criteria, MarkerQuery};
pub use registry::{Generation, MapOptions, Registry, StateRecord};
pub use service::{
    Document, Evented, LiveInfoWindow, LiveMap, LiveMarker, MapHandle, MapService, MapSettings,
    MapTypeId, MarkerHandle,
};

/// Storage key of one map-hosting element.
pub type AnchorId = String;
