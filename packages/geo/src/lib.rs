#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geographic zone assignment and proximity queries.
//!
//! Pure functions over coordinates: haversine distance, nearest-zone
//! assignment against a fixed zone-center table, radius-bounded search
//! over located records, and ray-casting point-in-polygon membership for
//! irregular sector boundaries. Nothing here performs I/O except loading
//! zone tables from TOML, and nothing holds mutable state except the
//! explicitly constructed [`zone::ZoneRegistry`].

pub mod distance;
pub mod polygon;
pub mod radius;
pub mod registry;
pub mod zone;

pub use distance::{EARTH_RADIUS_KM, haversine_distance_km};
pub use polygon::{close_polygon, is_closed_polygon, point_in_polygon, point_on_boundary};
pub use radius::{RadiusMatch, nearest_n, radius_search};
pub use rtcc_geo_models::{
    Coordinate, HasCoordinate, InvalidCoordinateError, LocatedRecord, LocatedRecordKind,
    ZoneAssignable, ZoneCenter,
};
pub use zone::{ZoneRegistry, ZoneTable, nearest_zone};

use thiserror::Error;

/// Errors that can occur during geo index operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Malformed input shape (too few polygon vertices, negative radius).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of what went wrong.
        message: String,
    },

    /// The caller's configuration cannot satisfy the operation (e.g. an
    /// empty zone table).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what went wrong.
        message: String,
    },

    /// A coordinate in a zone table is out of range.
    #[error("{0}")]
    InvalidCoordinate(#[from] InvalidCoordinateError),

    /// Zone table TOML failed to parse.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Zone table file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeoError {
    /// Shorthand for [`GeoError::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`GeoError::Configuration`].
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
