//! In-memory mapping service and document.
//!
//! Nothing is rendered. Live objects keep their state in cells, listeners fire
//! synchronously on [`Evented::trigger`] and geocode requests queue until
//! [`HeadlessService::resolve_geocodes`] is called, which is how a host event
//! loop would deliver them.

use crate::events::{Event, EventCallback};
use crate::geo::LatLng;
use crate::geocode::{GeocodeReply, GeocodeStatus, Geocoder};
use crate::marker::MarkerOptions;
use crate::service::{
    Document, Evented, InfoWindowHandle, LiveInfoWindow, LiveMap, LiveMarker, MapHandle,
    MapService, MapSettings, MapTypeId, MarkerHandle,
};
use crate::AnchorId;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

type GeocodeQueue = Rc<RefCell<VecDeque<(String, GeocodeReply)>>>;

#[derive(Default)]
struct Listeners(RefCell<Vec<(String, EventCallback)>>);

impl Listeners {
    fn add(&self, event: &str, callback: EventCallback) {
        self.0.borrow_mut().push((event.to_string(), callback));
    }

    fn fire(&self, event: &str, position: Option<LatLng>) {
        // Listeners may register further listeners
        let matching: Vec<EventCallback> = self
            .0
            .borrow()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        let event = Event::new(event, position);
        for callback in matching {
            callback(&event);
        }
    }
}

/// A [`MapService`] that keeps everything in memory.
#[derive(Default)]
pub struct HeadlessService {
    addresses: HashMap<String, LatLng>,
    queue: GeocodeQueue,
    maps_created: Cell<usize>,
    markers_created: Cell<usize>,
    geocoders_created: Cell<usize>,
}

impl HeadlessService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `address` resolve to `location`. Unknown addresses get `ZERO_RESULTS`.
    pub fn with_address(mut self, address: impl Into<String>, location: LatLng) -> Self {
        self.addresses.insert(address.into(), location);
        self
    }

    pub fn maps_created(&self) -> usize {
        self.maps_created.get()
    }

    pub fn markers_created(&self) -> usize {
        self.markers_created.get()
    }

    pub fn geocoders_created(&self) -> usize {
        self.geocoders_created.get()
    }

    pub fn pending_geocodes(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Answer every queued geocode request. Returns how many were answered.
    pub fn resolve_geocodes(&self) -> usize {
        let requests: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        let answered = requests.len();

        for (address, reply) in requests {
            match self.addresses.get(&address) {
                Some(location) => reply(GeocodeStatus::Ok, vec![*location]),
                None => reply(GeocodeStatus::ZeroResults, Vec::new()),
            }
        }
        answered
    }
}

impl MapService for HeadlessService {
    fn create_map(&self, anchor: &AnchorId, settings: &MapSettings) -> MapHandle {
        self.maps_created.set(self.maps_created.get() + 1);
        Rc::new(HeadlessMap {
            anchor: anchor.clone(),
            center: Cell::new(settings.center),
            zoom: Cell::new(settings.zoom),
            map_type: Cell::new(settings.map_type),
            listeners: Listeners::default(),
        })
    }

    fn create_marker(&self, _map: &MapHandle, options: &MarkerOptions) -> MarkerHandle {
        self.markers_created.set(self.markers_created.get() + 1);
        Rc::new(HeadlessMarker {
            position: Cell::new(options.position),
            options: options.clone(),
            listeners: Listeners::default(),
        })
    }

    fn create_info_window(&self, content: &str) -> InfoWindowHandle {
        Rc::new(HeadlessInfoWindow {
            content: content.to_string(),
            open: Cell::new(false),
        })
    }

    fn create_geocoder(&self) -> Rc<dyn Geocoder> {
        self.geocoders_created.set(self.geocoders_created.get() + 1);
        Rc::new(HeadlessGeocoder {
            queue: Rc::clone(&self.queue),
        })
    }
}

struct HeadlessGeocoder {
    queue: GeocodeQueue,
}

impl Geocoder for HeadlessGeocoder {
    fn geocode(&self, address: &str, reply: GeocodeReply) {
        self.queue.borrow_mut().push_back((address.to_string(), reply));
    }
}

/// Map state kept in cells.
pub struct HeadlessMap {
    anchor: AnchorId,
    center: Cell<LatLng>,
    zoom: Cell<u8>,
    map_type: Cell<MapTypeId>,
    listeners: Listeners,
}

impl Evented for HeadlessMap {
    fn add_listener(&self, event: &str, callback: EventCallback) {
        self.listeners.add(event, callback);
    }

    fn trigger(&self, event: &str) {
        self.listeners.fire(event, None);
    }
}

impl LiveMap for HeadlessMap {
    fn anchor(&self) -> &str {
        &self.anchor
    }

    fn center(&self) -> LatLng {
        self.center.get()
    }

    fn set_center(&self, center: LatLng) {
        self.center.set(center);
    }

    fn zoom(&self) -> u8 {
        self.zoom.get()
    }

    fn set_zoom(&self, zoom: u8) {
        self.zoom.set(zoom);
    }

    fn map_type(&self) -> MapTypeId {
        self.map_type.get()
    }

    fn set_map_type(&self, map_type: MapTypeId) {
        self.map_type.set(map_type);
    }
}

/// Marker whose events report its current position.
pub struct HeadlessMarker {
    position: Cell<LatLng>,
    options: MarkerOptions,
    listeners: Listeners,
}

impl Evented for HeadlessMarker {
    fn add_listener(&self, event: &str, callback: EventCallback) {
        self.listeners.add(event, callback);
    }

    fn trigger(&self, event: &str) {
        self.listeners.fire(event, Some(self.position.get()));
    }
}

impl LiveMarker for HeadlessMarker {
    fn position(&self) -> LatLng {
        self.position.get()
    }

    fn set_position(&self, position: LatLng) {
        self.position.set(position);
    }

    fn options(&self) -> &MarkerOptions {
        &self.options
    }
}

pub struct HeadlessInfoWindow {
    content: String,
    open: Cell<bool>,
}

impl LiveInfoWindow for HeadlessInfoWindow {
    fn content(&self) -> String {
        self.content.clone()
    }

    fn open(&self, _map: &MapHandle, _marker: &MarkerHandle) {
        self.open.set(true);
    }

    fn is_open(&self) -> bool {
        self.open.get()
    }
}

/// A [`Document`] made of `selector -> markup` entries.
#[derive(Debug, Default)]
pub struct HeadlessDocument {
    elements: HashMap<String, String>,
    hidden: RefCell<HashSet<String>>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, selector: impl Into<String>, html: impl Into<String>) -> Self {
        self.elements.insert(selector.into(), html.into());
        self
    }

    pub fn is_hidden(&self, selector: &str) -> bool {
        self.hidden.borrow().contains(selector)
    }
}

impl Document for HeadlessDocument {
    fn inner_html(&self, selector: &str) -> Option<String> {
        self.elements.get(selector).cloned()
    }

    fn hide(&self, selector: &str) {
        if self.elements.contains_key(selector) {
            self.hidden.borrow_mut().insert(selector.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MapSettings {
        MapSettings {
            center: LatLng::new(1.0, 2.0),
            zoom: 5,
            map_type: MapTypeId::Terrain,
        }
    }

    #[test]
    fn map_starts_from_settings() {
        let service = HeadlessService::new();
        let map = service.create_map(&"map".to_string(), &settings());
        assert_eq!(map.center(), LatLng::new(1.0, 2.0));
        assert_eq!(map.zoom(), 5);
        assert_eq!(map.map_type(), MapTypeId::Terrain);
        assert_eq!(service.maps_created(), 1);
    }

    #[test]
    fn marker_events_carry_position() {
        let service = HeadlessService::new();
        let map = service.create_map(&"map".to_string(), &settings());
        let marker = service.create_marker(&map, &MarkerOptions::at(LatLng::new(3.0, 4.0)));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        marker.add_listener(
            "dragend",
            Rc::new(move |e: &Event| sink.borrow_mut().push(e.position)),
        );

        marker.set_position(LatLng::new(5.0, 6.0));
        marker.trigger("dragend");
        assert_eq!(*seen.borrow(), vec![Some(LatLng::new(5.0, 6.0))]);
    }

    #[test]
    fn listener_may_register_listeners() {
        let service = HeadlessService::new();
        let map = service.create_map(&"map".to_string(), &settings());
        let inner = Rc::clone(&map);
        map.add_listener(
            "click",
            Rc::new(move |_: &Event| inner.add_listener("idle", Rc::new(|_: &Event| {}))),
        );
        map.trigger("click");
    }

    #[test]
    fn geocodes_wait_for_resolution() {
        let service = HeadlessService::new().with_address("Cambridge", LatLng::new(52.2, 0.1));
        let geocoder = service.create_geocoder();
        let status = Rc::new(Cell::new(None));
        let sink = Rc::clone(&status);
        geocoder.geocode("Nowhere", Box::new(move |s, _| sink.set(Some(s))));

        assert_eq!(service.pending_geocodes(), 1);
        assert_eq!(status.get(), None);
        assert_eq!(service.resolve_geocodes(), 1);
        assert_eq!(status.get(), Some(GeocodeStatus::ZeroResults));
        assert_eq!(service.pending_geocodes(), 0);
    }

    #[test]
    fn document_hides_known_elements_only() {
        let document = HeadlessDocument::new().with_element("#a", "<b>A</b>");
        assert_eq!(document.inner_html("#a").as_deref(), Some("<b>A</b>"));
        assert_eq!(document.inner_html("#b"), None);
        document.hide("#a");
        document.hide("#b");
        assert!(document.is_hidden("#a"));
        assert!(!document.is_hidden("#b"));
    }
}
