//! Event binding.
//!
//! [`Events`] is an ordered name → callback table, the declarative `events`
//! block of a marker spec or an `addevents` call. [`bind_events`] attaches it
//! to any [`Evented`] live object.

use crate::geo::LatLng;
use crate::service::Evented;
use std::fmt;
use std::rc::Rc;

/// Event names the mapping service emits for markers.
pub const MARKER_EVENTS: &[&str] = &[
    "click",
    "dblclick",
    "rightclick",
    "mousedown",
    "mouseup",
    "mouseover",
    "mouseout",
    "drag",
    "dragstart",
    "dragend",
];

/// What a listener receives.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    /// Position the event happened at, when the target has one.
    pub position: Option<LatLng>,
}

impl Event {
    pub fn new(name: impl Into<String>, position: Option<LatLng>) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

pub type EventCallback = Rc<dyn Fn(&Event)>;

/// Ordered table of event handlers.
#[derive(Clone, Default)]
pub struct Events {
    handlers: Vec<(String, EventCallback)>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler, builder style.
    pub fn on(mut self, event: impl Into<String>, callback: impl Fn(&Event) + 'static) -> Self {
        self.insert(event, Rc::new(callback));
        self
    }

    pub fn insert(&mut self, event: impl Into<String>, callback: EventCallback) {
        self.handlers.push((event.into(), callback));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventCallback)> {
        self.handlers.iter().map(|(name, cb)| (name.as_str(), cb))
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Attach every handler in `events` to `target`. Returns how many were bound.
pub fn bind_events<T: Evented + ?Sized>(target: &T, events: &Events) -> usize {
    for (name, callback) in events.iter() {
        target.add_listener(name, Rc::clone(callback));
    }
    tracing::trace!(count = events.len(), "bound event listeners");
    events.len()
}
