//! Marker selection.
//!
//! [`Criteria`] says what to look for; [`MarkerQuery`] runs it over one anchor's
//! marker sequence. Results always keep insertion order.

use crate::geo::{self, LatLng};
use crate::logging::diagnose;
use crate::marker::Marker;
use crate::{error::Result, value, Error};
use serde_json::Value;

/// What to select from a marker sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Criteria {
    /// Every marker
    #[default]
    All,
    /// The marker at this insertion index
    Index(usize),
    /// Markers whose live position equals this point exactly
    Position(LatLng),
    /// Markers whose `uid` equals this string exactly
    Uid(String),
    /// Markers whose options contain this (possibly nested) object
    Subset(Value),
}

impl Criteria {
    /// Interpret a loose declarative criteria value.
    ///
    /// Falsy values other than the number zero select everything, integers select
    /// by index, `[lat, lng]` by position, strings by uid and objects by subset.
    pub fn from_value(criteria: &Value) -> Result<Self> {
        match criteria {
            Value::Number(n) => match n.as_u64().or_else(|| whole_number(n.as_f64()?)) {
                Some(index) => usize::try_from(index)
                    .map(Criteria::Index)
                    .map_err(|_| Error::InvalidCriteria(format!("index {index} is too large"))),
                None => Err(Error::InvalidCriteria(format!(
                    "index must be a non-negative integer, got {n}"
                ))),
            },
            falsy if !value::is_truthy(falsy) => Ok(Criteria::All),
            Value::Array(_) => geo::to_point(criteria)
                .map(Criteria::Position)
                .map_err(|e| Error::InvalidCriteria(e.to_string())),
            Value::String(uid) => Ok(Criteria::Uid(uid.clone())),
            Value::Object(_) => Ok(Criteria::Subset(criteria.clone())),
            other => Err(Error::InvalidCriteria(format!(
                "cannot select markers by {}",
                value::kind(other)
            ))),
        }
    }
}

/// `2.0` is index 2.
fn whole_number(n: f64) -> Option<u64> {
    (n.fract() == 0.0 && (0.0..u64::MAX as f64).contains(&n)).then_some(n as u64)
}

impl From<usize> for Criteria {
    fn from(index: usize) -> Self {
        Criteria::Index(index)
    }
}

impl From<LatLng> for Criteria {
    fn from(position: LatLng) -> Self {
        Criteria::Position(position)
    }
}

impl From<&str> for Criteria {
    fn from(uid: &str) -> Self {
        Criteria::Uid(uid.to_string())
    }
}

impl From<String> for Criteria {
    fn from(uid: String) -> Self {
        Criteria::Uid(uid)
    }
}

/// Query over one anchor's markers.
#[derive(Debug)]
pub struct MarkerQuery<'a> {
    markers: &'a [Marker],
    max_depth: usize,
    debug: bool,
}

impl<'a> MarkerQuery<'a> {
    pub fn new(markers: &'a [Marker], max_depth: usize) -> Self {
        Self {
            markers,
            max_depth,
            debug: false,
        }
    }

    /// Report match problems as `warn` diagnostics.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Run `criteria`.
    pub fn select(self, criteria: &Criteria) -> Result<Vec<&'a Marker>> {
        match criteria {
            Criteria::All => Ok(self.all()),
            Criteria::Index(index) => self.get(*index).map(|marker| vec![marker]),
            Criteria::Position(position) => Ok(self.at(*position)),
            Criteria::Uid(uid) => Ok(self.by_uid(uid)),
            Criteria::Subset(needle) => Ok(self.matching(needle)),
        }
    }

    pub fn all(self) -> Vec<&'a Marker> {
        self.markers.iter().collect()
    }

    /// The marker at `index`, or [`Error::IndexOutOfBounds`].
    pub fn get(self, index: usize) -> Result<&'a Marker> {
        self.markers.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: self.markers.len(),
        })
    }

    pub fn at(self, position: LatLng) -> Vec<&'a Marker> {
        self.filter(|marker| marker.position() == position)
    }

    pub fn by_uid(self, uid: &str) -> Vec<&'a Marker> {
        self.filter(|marker| marker.uid() == Some(uid))
    }

    /// Markers whose caller-supplied options contain `needle`.
    ///
    /// A marker whose comparison runs past the depth limit does not match.
    pub fn matching(self, needle: &Value) -> Vec<&'a Marker> {
        let (max_depth, debug) = (self.max_depth, self.debug);
        self.filter(
            |marker| match value::is_subset(needle, marker.attributes(), max_depth) {
                Ok(found) => found,
                Err(e) => {
                    diagnose(debug, &e);
                    false
                }
            },
        )
    }

    pub fn filter<F>(self, predicate: F) -> Vec<&'a Marker>
    where
        F: Fn(&Marker) -> bool,
    {
        self.markers.iter().filter(|m| predicate(m)).collect()
    }

    pub fn first(self) -> Option<&'a Marker> {
        self.markers.first()
    }

    pub fn count(self) -> usize {
        self.markers.len()
    }
}
