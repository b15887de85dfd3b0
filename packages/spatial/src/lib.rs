#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial indexes for sector attribution and proximity queries.
//!
//! [`SectorIndex`] holds named sector boundaries in an R-tree and answers
//! "which sector is this point in" with an envelope query followed by the
//! exact point-in-polygon test. [`RecordIndex`] holds a fixed set of
//! located records and narrows radius searches with a bounding-box query
//! before the exact haversine check.
//!
//! Both are constructed explicitly by the owning service and shared by
//! reference; neither is mutated after construction.

mod records;
mod sector;

pub use records::RecordIndex;
pub use sector::{Sector, SectorIndex};

use rtcc_geo::GeoError;
use thiserror::Error;

/// Errors that can occur while building or querying spatial indexes.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Geo index operation failed.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Input could not be converted into sector boundaries.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
