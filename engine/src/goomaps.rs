//! The caller-facing facade.
//!
//! A [`Goomaps`] owns the capabilities, the configuration, one geocoder and the
//! registry. Every operation runs over a collection of anchors; operations that
//! need a map check every anchor before touching any of them.

use crate::config::Config;
use crate::events::Events;
use crate::geocode::GeocodeClient;
use crate::logging::diagnose;
use crate::marker::{Marker, MarkerSpec};
use crate::operation::Operation;
use crate::overlay::BuildReport;
use crate::query::Criteria;
use crate::registry::{Context, MapOptions, Registry};
use crate::service::{Document, MapHandle, MapService};
use crate::{error::Result, Error};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// What an operation produced.
#[derive(Debug)]
pub enum Outcome {
    Done,
    /// Markers built by `setmarkers`, summed over all anchors
    Added(BuildReport),
    /// Markers selected by `getmarkers`
    Markers(Vec<Marker>),
}

/// Declarative maps over a set of anchors.
pub struct Goomaps {
    service: Rc<dyn MapService>,
    document: Rc<dyn Document>,
    geocoder: GeocodeClient,
    config: Config,
    registry: Registry,
}

impl Goomaps {
    pub fn new(service: Rc<dyn MapService>, document: Rc<dyn Document>, config: Config) -> Self {
        Self {
            geocoder: GeocodeClient::new(Rc::clone(&service)),
            service,
            document,
            config,
            registry: Registry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Live map of `anchor`, if initialized.
    pub fn map(&self, anchor: &str) -> Option<MapHandle> {
        self.registry.state(anchor).map(|record| Rc::clone(record.map()))
    }

    /// Markers of `anchor` in insertion order.
    pub fn markers(&self, anchor: &str) -> Result<&[Marker]> {
        self.registry.require(anchor).map(|record| record.markers())
    }

    pub fn set_data(&mut self, anchor: &str, key: &str, data: Value) -> Result<()> {
        self.registry.set_data(anchor, key, data)
    }

    pub fn data(&self, anchor: &str, key: &str) -> Option<&Value> {
        self.registry.data(anchor, key)
    }

    pub fn init(&mut self, anchors: &[&str], options: &MapOptions) -> Result<()> {
        self.enable_debug(options);
        let (ctx, registry) = self.split();
        for anchor in anchors {
            registry.init(&ctx, anchor, options);
        }
        Ok(())
    }

    pub fn update(&mut self, anchors: &[&str], options: &MapOptions) -> Result<()> {
        self.require_all(anchors)?;
        self.enable_debug(options);
        let (ctx, registry) = self.split();
        for anchor in anchors {
            registry.update(&ctx, anchor, options)?;
        }
        Ok(())
    }

    pub fn destroy(&mut self, anchors: &[&str], key: Option<&str>) -> Result<()> {
        for anchor in anchors {
            self.registry.destroy(anchor, key);
        }
        Ok(())
    }

    /// Build `specs` on every anchor. Malformed specs are skipped and reported.
    pub fn set_markers(&mut self, anchors: &[&str], specs: &[MarkerSpec]) -> Result<BuildReport> {
        self.require_all(anchors)?;
        let (ctx, registry) = self.split();
        let mut report = BuildReport::default();
        for anchor in anchors {
            report.merge(registry.set_markers(&ctx, anchor, specs)?);
        }
        Ok(report)
    }

    /// Select markers of the first anchor.
    pub fn get_markers(&self, anchors: &[&str], criteria: &Criteria) -> Result<Vec<Marker>> {
        let Some(anchor) = anchors.first() else {
            return Ok(Vec::new());
        };
        let selected = self.registry.query(anchor, &self.config)?.select(criteria)?;
        Ok(selected.into_iter().cloned().collect())
    }

    /// Bind `events` to the map of every anchor.
    pub fn add_events(&mut self, anchors: &[&str], events: &Events) -> Result<()> {
        self.require_all(anchors)?;
        for anchor in anchors {
            self.registry.add_events(anchor, events)?;
        }
        Ok(())
    }

    /// Run `op` over `anchors`.
    pub fn apply(&mut self, anchors: &[&str], op: Operation) -> Result<Outcome> {
        tracing::trace!(method = op.name(), anchors = anchors.len(), "applying operation");
        match op {
            Operation::Init(options) => self.init(anchors, &options).map(|_| Outcome::Done),
            Operation::Update(options) => self.update(anchors, &options).map(|_| Outcome::Done),
            Operation::Destroy(key) => self
                .destroy(anchors, key.as_deref())
                .map(|_| Outcome::Done),
            Operation::SetMarkers(specs) => self.set_markers(anchors, &specs).map(Outcome::Added),
            Operation::GetMarkers(criteria) => {
                self.get_markers(anchors, &criteria).map(Outcome::Markers)
            }
            Operation::AddEvents(events) => {
                self.add_events(anchors, &events).map(|_| Outcome::Done)
            }
        }
    }

    /// Parse and run a method call. A missing method means `init`.
    ///
    /// Unknown methods fail. Malformed `getmarkers` criteria select nothing. Any
    /// other malformed argument is reported and the method runs as if it had
    /// been called without one.
    pub fn call(&mut self, anchors: &[&str], method: Option<&str>, args: &Value) -> Result<Outcome> {
        match Operation::from_call(method, args) {
            Ok(op) => self.apply(anchors, op),
            Err(e @ Error::InvalidCriteria(_)) => {
                diagnose(self.config.debug, &e);
                Ok(Outcome::Markers(Vec::new()))
            }
            Err(e @ Error::InvalidPayload(_)) => {
                diagnose(self.config.debug, &e);
                let op = Operation::from_call(method, &Value::Null)?;
                self.apply(anchors, op)
            }
            Err(e) => Err(e),
        }
    }

    fn require_all(&self, anchors: &[&str]) -> Result<()> {
        for anchor in anchors {
            self.registry.require(anchor)?;
        }
        Ok(())
    }

    fn enable_debug(&mut self, options: &MapOptions) {
        if options.debug == Some(true) && !self.config.debug {
            self.config.debug = true;
            tracing::debug!("debug diagnostics enabled");
        }
    }

    fn split(&mut self) -> (Context<'_>, &mut Registry) {
        let ctx = Context {
            service: &*self.service,
            document: &*self.document,
            geocoder: &self.geocoder,
            config: &self.config,
        };
        (ctx, &mut self.registry)
    }
}

impl fmt::Debug for Goomaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Goomaps")
            .field("config", &self.config)
            .field("geocoder", &self.geocoder)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessDocument, HeadlessService};
    use serde_json::json;

    fn goomaps() -> (Rc<HeadlessService>, Goomaps) {
        let service = Rc::new(HeadlessService::new());
        let goomaps = Goomaps::new(
            service.clone(),
            Rc::new(HeadlessDocument::new()),
            Config::default(),
        );
        (service, goomaps)
    }

    #[test]
    fn init_every_anchor() {
        let (service, mut goomaps) = goomaps();
        goomaps.init(&["a", "b"], &MapOptions::new()).unwrap();
        assert_eq!(service.maps_created(), 2);
        assert_eq!(goomaps.registry().len(), 2);
    }

    #[test]
    fn precondition_checked_before_any_mutation() {
        let (service, mut goomaps) = goomaps();
        goomaps.init(&["a"], &MapOptions::new()).unwrap();

        let specs = [MarkerSpec::new(json!({"position": [1, 1]}))];
        assert_eq!(
            goomaps.set_markers(&["a", "b"], &specs).unwrap_err(),
            Error::NotInitialized("b".into())
        );
        assert!(goomaps.markers("a").unwrap().is_empty());
        assert_eq!(service.markers_created(), 0);
    }

    #[test]
    fn debug_option_turns_diagnostics_on() {
        let (_, mut goomaps) = goomaps();
        assert!(!goomaps.config().debug);
        goomaps
            .init(&["a"], &MapOptions::new().with_debug(true))
            .unwrap();
        assert!(goomaps.config().debug);
        goomaps
            .update(&["a"], &MapOptions::new().with_debug(false))
            .unwrap();
        assert!(goomaps.config().debug);
    }

    #[test]
    fn get_markers_reads_the_first_anchor() {
        let (_, mut goomaps) = goomaps();
        goomaps.init(&["a", "b"], &MapOptions::new()).unwrap();
        goomaps
            .set_markers(&["b"], &[MarkerSpec::new(json!({"position": [1, 1]}))])
            .unwrap();

        assert!(goomaps.get_markers(&["a", "b"], &Criteria::All).unwrap().is_empty());
        assert_eq!(goomaps.get_markers(&["b", "a"], &Criteria::All).unwrap().len(), 1);
        assert!(goomaps.get_markers(&[], &Criteria::All).unwrap().is_empty());
    }

    #[test]
    fn call_dispatches_by_name() {
        let (_, mut goomaps) = goomaps();
        goomaps.call(&["a"], None, &json!({"zoom": 3})).unwrap();
        assert_eq!(goomaps.map("a").unwrap().zoom(), 3);

        let outcome = goomaps
            .call(
                &["a"],
                Some("setmarkers"),
                &json!({"options": {"position": [1, 1], "uid": "x"}}),
            )
            .unwrap();
        assert!(matches!(outcome, Outcome::Added(ref r) if r.added == 1));

        let Outcome::Markers(found) = goomaps.call(&["a"], Some("getmarkers"), &json!("x")).unwrap()
        else {
            panic!("expected markers");
        };
        assert_eq!(found.len(), 1);

        assert_eq!(
            goomaps.call(&["a"], Some("fly"), &Value::Null).unwrap_err(),
            Error::UnknownOperation("fly".into())
        );
    }

    #[test]
    fn malformed_criteria_selects_nothing() {
        let (_, mut goomaps) = goomaps();
        goomaps.init(&["a"], &MapOptions::new()).unwrap();
        goomaps
            .set_markers(&["a"], &[MarkerSpec::new(json!({"position": [1, 1]}))])
            .unwrap();

        let outcome = goomaps.call(&["a"], Some("getmarkers"), &json!(true)).unwrap();
        assert!(matches!(outcome, Outcome::Markers(ref m) if m.is_empty()));
    }

    #[test]
    fn malformed_arguments_fall_back_to_none() {
        let (service, mut goomaps) = goomaps();
        goomaps
            .call(&["a"], None, &json!({"center": [1, 2], "zoom": 300, "debug": "yes"}))
            .unwrap();
        let map = goomaps.map("a").unwrap();
        assert_eq!(map.center(), crate::LatLng::new(1.0, 2.0));
        assert_eq!(map.zoom(), goomaps.config().default_zoom);

        let outcome = goomaps.call(&["a"], Some("setmarkers"), &json!("pins")).unwrap();
        assert!(matches!(outcome, Outcome::Added(ref r) if r.added == 0));
        assert_eq!(service.markers_created(), 0);

        assert_eq!(
            goomaps.call(&["b"], Some("setmarkers"), &json!(7)).unwrap_err(),
            Error::NotInitialized("b".into())
        );

        goomaps.call(&["a"], Some("destroy"), &json!(3)).unwrap();
        assert!(goomaps.map("a").is_none());
    }

    #[test]
    fn destroy_over_all_anchors() {
        let (_, mut goomaps) = goomaps();
        goomaps.init(&["a", "b"], &MapOptions::new()).unwrap();
        goomaps
            .apply(&["a", "b"], Operation::Destroy(None))
            .unwrap();
        assert!(goomaps.registry().is_empty());
        assert!(goomaps.map("a").is_none());
    }
}
