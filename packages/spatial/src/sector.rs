//! Named sector boundaries indexed for point lookups.

use std::collections::BTreeSet;

use geo::BoundingRect;
use geojson::{Feature, GeoJson};
use rstar::{AABB, RTree, RTreeObject};
use rtcc_geo::{GeoError, point_in_polygon, point_on_boundary};
use rtcc_geo_models::{Coordinate, HasCoordinate};

use crate::SpatialError;

/// A named sector boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    /// Sector name (e.g. "Zone 3").
    pub name: String,
    /// Boundary vertices, open or closed.
    pub boundary: Vec<Coordinate>,
    /// Interior rings cut out of the boundary (enclaves).
    pub holes: Vec<Vec<Coordinate>>,
}

impl Sector {
    /// Creates a sector.
    #[must_use]
    pub fn new(name: impl Into<String>, boundary: Vec<Coordinate>) -> Self {
        Self {
            name: name.into(),
            boundary,
            holes: Vec::new(),
        }
    }

    /// Adds interior rings to cut out of this sector.
    #[must_use]
    pub fn with_holes(mut self, holes: Vec<Vec<Coordinate>>) -> Self {
        self.holes = holes;
        self
    }

    /// Whether `point` is inside the boundary and not strictly inside any
    /// hole. A hole's own edge still belongs to the sector.
    fn covers(&self, point: &impl HasCoordinate) -> Result<bool, GeoError> {
        if !point_in_polygon(point, &self.boundary)? {
            return Ok(false);
        }

        for hole in &self.holes {
            if point_in_polygon(point, hole)? && !point_on_boundary(point, hole) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Envelope of one boundary ring, pointing back at its slot in the
/// index's part list.
struct PartEnvelope {
    part: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for PartEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built R-tree of sector boundaries.
///
/// A sector given as a `MultiPolygon` is stored as one part per member
/// polygon, all under the same name. Parts keep their definition order,
/// which decides overlaps.
pub struct SectorIndex {
    parts: Vec<Sector>,
    tree: RTree<PartEnvelope>,
    names: Vec<String>,
}

impl SectorIndex {
    /// Builds an index from sectors in priority order.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidArgument`] if a boundary or hole has
    /// fewer than 3 vertices.
    pub fn from_sectors(sectors: Vec<Sector>) -> Result<Self, SpatialError> {
        for sector in &sectors {
            if sector.boundary.len() < 3 {
                return Err(GeoError::invalid_argument(format!(
                    "sector '{}' needs at least 3 vertices, got {}",
                    sector.name,
                    sector.boundary.len()
                ))
                .into());
            }
            if let Some(hole) = sector.holes.iter().find(|h| h.len() < 3) {
                return Err(GeoError::invalid_argument(format!(
                    "hole in sector '{}' needs at least 3 vertices, got {}",
                    sector.name,
                    hole.len()
                ))
                .into());
            }
        }

        let mut seen = BTreeSet::new();
        let names: Vec<String> = sectors
            .iter()
            .filter(|s| seen.insert(s.name.clone()))
            .map(|s| s.name.clone())
            .collect();

        let envelopes: Vec<PartEnvelope> = sectors
            .iter()
            .enumerate()
            .map(|(part, sector)| PartEnvelope {
                part,
                envelope: compute_envelope(&sector.boundary),
            })
            .collect();

        let index = Self {
            parts: sectors,
            tree: RTree::bulk_load(envelopes),
            names,
        };

        log::info!(
            "Built sector index: {} sectors, {} boundary parts",
            index.names.len(),
            index.parts.len()
        );

        Ok(index)
    }

    /// Builds an index from a `GeoJSON` `FeatureCollection` (or a single
    /// `Feature`) of `Polygon`/`MultiPolygon` features, naming each sector
    /// from the `name_property` feature property.
    ///
    /// Features without a usable name or polygon geometry are skipped with
    /// a warning. Interior rings are kept as holes; a point inside a hole
    /// is outside the sector.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid `GeoJSON` or is a bare
    /// geometry rather than features.
    pub fn from_geojson(geojson_str: &str, name_property: &str) -> Result<Self, SpatialError> {
        let features = match geojson_str.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => {
                return Err(SpatialError::Conversion {
                    message: "expected a GeoJSON Feature or FeatureCollection, got a bare geometry"
                        .to_string(),
                });
            }
        };

        let mut sectors = Vec::new();
        for (i, feature) in features.into_iter().enumerate() {
            let Some(name) = feature_name(&feature, name_property) else {
                log::warn!("Skipping sector feature {i}: missing '{name_property}' property");
                continue;
            };

            let polygons = feature_polygons(feature);
            if polygons.is_empty() {
                log::warn!("Skipping sector '{name}': no polygon geometry");
                continue;
            }

            for (exterior, interiors) in polygons {
                if exterior.len() < 3 {
                    log::warn!("Skipping degenerate ring in sector '{name}'");
                    continue;
                }

                let holes: Vec<_> = interiors
                    .into_iter()
                    .filter(|hole| {
                        let usable = hole.len() >= 3;
                        if !usable {
                            log::warn!("Skipping degenerate hole in sector '{name}'");
                        }
                        usable
                    })
                    .collect();

                sectors.push(Sector::new(name.clone(), exterior).with_holes(holes));
            }
        }

        Self::from_sectors(sectors)
    }

    /// Name of the sector containing `point`, if any.
    ///
    /// Boundary points count as inside. When sectors overlap, the one
    /// defined first wins.
    #[must_use]
    pub fn lookup(&self, point: &impl HasCoordinate) -> Option<&str> {
        let query_env = AABB::from_point(point.coordinate().to_lng_lat());

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| matches!(self.parts[entry.part].covers(point), Ok(true)))
            .map(|entry| entry.part)
            .min()
            .map(|part| self.parts[part].name.as_str())
    }

    /// Whether `point` is inside the named sector.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Configuration`] if no sector has that name.
    pub fn contains(
        &self,
        sector_name: &str,
        point: &impl HasCoordinate,
    ) -> Result<bool, SpatialError> {
        let mut found = false;
        for part in self.parts.iter().filter(|p| p.name == sector_name) {
            found = true;
            if part.covers(point)? {
                return Ok(true);
            }
        }

        if found {
            Ok(false)
        } else {
            Err(GeoError::configuration(format!("unknown sector '{sector_name}'")).into())
        }
    }

    /// Distinct sector names in definition order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of distinct sectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index holds no sectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Reads the sector name from a feature property. Numeric ids are
/// accepted and stringified.
fn feature_name(feature: &Feature, name_property: &str) -> Option<String> {
    let value = feature.property(name_property)?;
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| value.as_i64().map(|n| n.to_string()))
}

/// Exterior and interior rings of each polygon in a feature's
/// `Polygon`/`MultiPolygon` geometry.
fn feature_polygons(feature: Feature) -> Vec<(Vec<Coordinate>, Vec<Vec<Coordinate>>)> {
    let Some(geometry) = feature.geometry else {
        return Vec::new();
    };

    let geo_geom: geo::Geometry<f64> = match geometry.try_into() {
        Ok(geom) => geom,
        Err(e) => {
            log::warn!("Failed to convert sector geometry: {e}");
            return Vec::new();
        }
    };

    let polygons = match geo_geom {
        geo::Geometry::Polygon(p) => vec![p],
        geo::Geometry::MultiPolygon(mp) => mp.0,
        _ => return Vec::new(),
    };

    polygons
        .iter()
        .map(|polygon| {
            let holes = polygon.interiors().iter().map(ring_coordinates).collect();
            (ring_coordinates(polygon.exterior()), holes)
        })
        .collect()
}

fn ring_coordinates(ring: &geo::LineString<f64>) -> Vec<Coordinate> {
    ring.coords().map(|c| Coordinate::new(c.y, c.x)).collect()
}

/// Compute the bounding box envelope for a boundary ring.
fn compute_envelope(ring: &[Coordinate]) -> AABB<[f64; 2]> {
    let line: geo::LineString<f64> = ring.iter().map(|c| (c.longitude, c.latitude)).collect();

    line.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
