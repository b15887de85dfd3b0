#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Coordinate, zone and located-record types.
//!
//! These types are shared by every consumer of the geo index: camera
//! catalogs, hydrant and fire-station services, officer telemetry and the
//! sensor grid registry. Record types from those services plug into the
//! index through the [`HasCoordinate`] and [`ZoneAssignable`] capabilities
//! rather than a common base type.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude, -90 to 90.
    pub latitude: f64,
    /// Longitude, -180 to 180.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate without range checking.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Creates a coordinate, rejecting values outside the valid
    /// latitude/longitude ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if either component is out of range or NaN.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinateError> {
        let coordinate = Self::new(latitude, longitude);
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(InvalidCoordinateError {
                latitude,
                longitude,
            })
        }
    }

    /// Whether both components are within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Returns `[longitude, latitude]`, the x/y order used by `GeoJSON`
    /// and the R-tree indexes.
    #[must_use]
    pub const fn to_lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Error returned when a [`Coordinate`] is outside the valid range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinateError {
    /// The latitude that was provided.
    pub latitude: f64,
    /// The longitude that was provided.
    pub longitude: f64,
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid coordinate ({}, {}): expected latitude -90..=90 and longitude -180..=180",
            self.latitude, self.longitude
        )
    }
}

impl std::error::Error for InvalidCoordinateError {}

/// A named patrol or service-response zone, represented by its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCenter {
    /// Zone name as persisted on assigned records (e.g. "North").
    pub name: String,
    /// Center point used for nearest-zone assignment.
    pub center: Coordinate,
}

impl ZoneCenter {
    /// Creates a zone center.
    #[must_use]
    pub fn new(name: impl Into<String>, center: Coordinate) -> Self {
        Self {
            name: name.into(),
            center,
        }
    }
}

/// A zone table definition, deserialized from TOML.
///
/// ```toml
/// id = "riviera_beach"
/// name = "Riviera Beach Patrol Zones"
///
/// [[zones]]
/// name = "North"
/// latitude = 26.7912
/// longitude = -80.0345
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneTableDef {
    /// Unique table identifier.
    pub id: String,
    /// Human-readable table name.
    pub name: String,
    /// Zone centers, in tie-break order.
    pub zones: Vec<ZoneCenterDef>,
}

/// A single zone row in a [`ZoneTableDef`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneCenterDef {
    /// Zone name.
    pub name: String,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
}

impl From<&ZoneCenterDef> for ZoneCenter {
    fn from(def: &ZoneCenterDef) -> Self {
        Self::new(def.name.clone(), Coordinate::new(def.latitude, def.longitude))
    }
}

/// Anything positioned by a single coordinate.
pub trait HasCoordinate {
    /// The position of this item.
    fn coordinate(&self) -> Coordinate;
}

impl HasCoordinate for Coordinate {
    fn coordinate(&self) -> Coordinate {
        *self
    }
}

impl HasCoordinate for ZoneCenter {
    fn coordinate(&self) -> Coordinate {
        self.center
    }
}

impl<T: HasCoordinate + ?Sized> HasCoordinate for &T {
    fn coordinate(&self) -> Coordinate {
        (**self).coordinate()
    }
}

/// A located record whose owning service stores the zone it falls in.
pub trait ZoneAssignable: HasCoordinate {
    /// Currently assigned zone, if any.
    fn assigned_zone(&self) -> Option<&str>;

    /// Stores the zone name computed by the geo index.
    fn set_assigned_zone(&mut self, zone: String);
}

/// Kind of entity a [`LocatedRecord`] describes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LocatedRecordKind {
    /// Traffic or public-safety camera.
    Camera,
    /// Fire hydrant.
    Hydrant,
    /// Fire station.
    FireStation,
    /// Last reported officer position.
    OfficerPosition,
    /// Sensor grid node (gunshot detection, LPR, etc).
    Sensor,
}

/// A generic located record.
///
/// Services with richer record types implement [`HasCoordinate`] and
/// [`ZoneAssignable`] directly; this shape is what the CLI reads and
/// writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedRecord {
    /// Record identifier within its owning service.
    pub id: String,
    /// Entity kind.
    pub kind: LocatedRecordKind,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Record position.
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Zone stamped by the geo index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_zone: Option<String>,
}

impl LocatedRecord {
    /// Creates an unassigned record.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: LocatedRecordKind, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            kind,
            name: None,
            coordinate,
            assigned_zone: None,
        }
    }
}

impl HasCoordinate for LocatedRecord {
    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

impl ZoneAssignable for LocatedRecord {
    fn assigned_zone(&self) -> Option<&str> {
        self.assigned_zone.as_deref()
    }

    fn set_assigned_zone(&mut self, zone: String) {
        self.assigned_zone = Some(zone);
    }
}
