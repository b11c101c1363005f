//! Address geocoding.
//!
//! The mapping service's [`Geocoder`] answers asynchronously through a reply
//! callback. [`GeocodeClient`] wraps it for one facade: it creates the geocoder
//! lazily on first use, validates the request and only ever calls back with a
//! resolved point. Failures are diagnostics, never callbacks.

use crate::geo::LatLng;
use crate::logging::diagnose;
use crate::service::MapService;
use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

/// Status reported by the geocoding service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeocodeStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
}

impl fmt::Display for GeocodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeocodeStatus::Ok => "OK",
            GeocodeStatus::ZeroResults => "ZERO_RESULTS",
            GeocodeStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            GeocodeStatus::RequestDenied => "REQUEST_DENIED",
            GeocodeStatus::InvalidRequest => "INVALID_REQUEST",
            GeocodeStatus::UnknownError => "UNKNOWN_ERROR",
        };
        f.write_str(name)
    }
}

/// Reply delivered by the geocoder once the lookup completes.
pub type GeocodeReply = Box<dyn FnOnce(GeocodeStatus, Vec<LatLng>)>;

/// Address lookup capability. `reply` may run after `geocode` returns.
pub trait Geocoder {
    fn geocode(&self, address: &str, reply: GeocodeReply);
}

/// Per-facade geocoding entry point.
pub struct GeocodeClient {
    service: Rc<dyn MapService>,
    geocoder: OnceCell<Rc<dyn Geocoder>>,
}

impl GeocodeClient {
    pub fn new(service: Rc<dyn MapService>) -> Self {
        Self {
            service,
            geocoder: OnceCell::new(),
        }
    }

    /// Whether the underlying geocoder has been created yet.
    pub fn is_started(&self) -> bool {
        self.geocoder.get().is_some()
    }

    /// Resolve `address` and hand the first result to `on_resolved`.
    ///
    /// Returns [`Error::InvalidAddress`] for an empty address without contacting
    /// the service. A non-OK status, or an OK status without results, is logged
    /// (when `debug` is set) and `on_resolved` is dropped uncalled.
    pub fn geocode(
        &self,
        address: &str,
        debug: bool,
        on_resolved: impl FnOnce(LatLng) + 'static,
    ) -> Result<()> {
        if address.trim().is_empty() {
            return Err(Error::InvalidAddress);
        }

        let geocoder = self
            .geocoder
            .get_or_init(|| self.service.create_geocoder());

        let requested = address.to_string();
        tracing::debug!(address = %requested, "geocoding address");
        geocoder.geocode(
            address,
            Box::new(move |status, results| match (status, results.first()) {
                (GeocodeStatus::Ok, Some(location)) => on_resolved(*location),
                (GeocodeStatus::Ok, None) => {
                    diagnose(debug, &Error::GeocodeFailed(GeocodeStatus::ZeroResults))
                }
                (status, _) => {
                    tracing::debug!(address = %requested, %status, "geocode failed");
                    diagnose(debug, &Error::GeocodeFailed(status));
                }
            }),
        );
        Ok(())
    }
}

impl fmt::Debug for GeocodeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocodeClient")
            .field("started", &self.is_started())
            .finish()
    }
}
