//! Error types for the goomaps engine.

use crate::geocode::GeocodeStatus;
use crate::AnchorId;
use thiserror::Error;

/// All possible errors from the goomaps engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    // Registry errors
    #[error("anchor '{0}' has no map, call init first")]
    NotInitialized(AnchorId),

    #[error("method '{0}' does not exist on goomaps")]
    UnknownOperation(String),

    // Normalization errors
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("invalid center: {0}")]
    InvalidCenter(String),

    #[error("unknown map type: {0}")]
    InvalidMapType(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    // Marker errors
    #[error("marker {index} must be provided with a position")]
    MissingPosition { index: usize },

    #[error("marker {index} is invalid: {reason}")]
    InvalidMarker { index: usize, reason: String },

    #[error("no content found for selector '{0}'")]
    MissingContent(String),

    // Query errors
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("marker index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("match depth limit of {0} exceeded")]
    MatchDepthExceeded(usize),

    // Geocoder errors
    #[error("geocoder requires a non-empty address string")]
    InvalidAddress,

    #[error("geocoder status returned: {0}")]
    GeocodeFailed(GeocodeStatus),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::NotInitialized("map_canvas".into());
        assert_eq!(
            err.to_string(),
            "anchor 'map_canvas' has no map, call init first"
        );

        let err = Error::UnknownOperation("zoomto".into());
        assert_eq!(err.to_string(), "method 'zoomto' does not exist on goomaps");

        let err = Error::IndexOutOfBounds { index: 4, len: 2 };
        assert_eq!(err.to_string(), "marker index 4 out of bounds (len 2)");

        let err = Error::GeocodeFailed(GeocodeStatus::ZeroResults);
        assert_eq!(err.to_string(), "geocoder status returned: ZERO_RESULTS");
    }
}
