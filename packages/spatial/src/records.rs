//! Radius search over a fixed record set with an R-tree pre-filter.

use rstar::{AABB, RTree, RTreeObject};
use rtcc_geo::distance::bounding_box_km;
use rtcc_geo::haversine_distance_km;
use rtcc_geo::radius::{RadiusMatch, sort_by_distance, validate_radius};
use rtcc_geo_models::HasCoordinate;

use crate::SpatialError;

/// Position of one record, pointing back at its slot in
/// [`RecordIndex::records`].
struct RecordPoint {
    slot: usize,
    position: [f64; 2],
}

impl RTreeObject for RecordPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// A fixed set of located records with a point R-tree over their
/// positions.
///
/// Results are identical to [`rtcc_geo::radius_search`] over the same
/// records in the same order. Records with out-of-range coordinates are
/// kept out of the tree and always checked directly; an out-of-range
/// center skips the tree and checks every record.
pub struct RecordIndex<T> {
    records: Vec<T>,
    tree: RTree<RecordPoint>,
    unindexed: Vec<usize>,
}

impl<T: HasCoordinate> RecordIndex<T> {
    /// Bulk-loads an index over `records`.
    #[must_use]
    pub fn new(records: Vec<T>) -> Self {
        let mut points = Vec::with_capacity(records.len());
        let mut unindexed = Vec::new();

        for (slot, record) in records.iter().enumerate() {
            let coordinate = record.coordinate();
            if coordinate.is_valid() {
                points.push(RecordPoint {
                    slot,
                    position: coordinate.to_lng_lat(),
                });
            } else {
                unindexed.push(slot);
            }
        }

        if !unindexed.is_empty() {
            log::warn!(
                "{} of {} records have out-of-range coordinates and bypass the spatial index",
                unindexed.len(),
                records.len()
            );
        }

        log::info!("Built record index over {} records", records.len());

        Self {
            records,
            tree: RTree::bulk_load(points),
            unindexed,
        }
    }

    /// Every record within `radius_km` of `center` (inclusive), nearest
    /// first, ties in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`rtcc_geo::GeoError::InvalidArgument`] if `radius_km` is
    /// negative or NaN.
    pub fn radius_search(
        &self,
        center: &impl HasCoordinate,
        radius_km: f64,
    ) -> Result<Vec<RadiusMatch<'_, T>>, SpatialError> {
        validate_radius(radius_km)?;

        let candidates: Vec<usize> = if center.coordinate().is_valid() {
            let (min, max) = bounding_box_km(center, radius_km);
            let query_env = AABB::from_corners(min.to_lng_lat(), max.to_lng_lat());

            let mut slots: Vec<usize> = self
                .tree
                .locate_in_envelope(&query_env)
                .map(|point| point.slot)
                .chain(self.unindexed.iter().copied())
                .collect();
            slots.sort_unstable();
            slots
        } else {
            log::debug!("Out-of-range search center; scanning all records");
            (0..self.records.len()).collect()
        };

        let mut matches: Vec<_> = candidates
            .into_iter()
            .filter_map(|slot| {
                let record = &self.records[slot];
                let distance_km = haversine_distance_km(center, record);
                (distance_km <= radius_km).then_some(RadiusMatch {
                    record,
                    distance_km,
                })
            })
            .collect();

        sort_by_distance(&mut matches);

        log::debug!(
            "RecordIndex::radius_search: {} matches within {radius_km} km ({} records)",
            matches.len(),
            self.records.len()
        );

        Ok(matches)
    }

    /// The indexed records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcc_geo::GeoError;
    use rtcc_geo_models::{Coordinate, LocatedRecord, LocatedRecordKind};

    fn grid_records() -> Vec<LocatedRecord> {
        let mut records = Vec::new();
        for i in 0..15 {
            for j in 0..15 {
                let coordinate = Coordinate::new(
                    f64::from(i).mul_add(0.004, 26.75),
                    f64::from(j).mul_add(0.004, -80.08),
                );
                records.push(LocatedRecord::new(
                    format!("cam-{i}-{j}"),
                    LocatedRecordKind::Camera,
                    coordinate,
                ));
            }
        }
        records
    }

    fn ids(matches: &[RadiusMatch<'_, LocatedRecord>]) -> Vec<String> {
        matches.iter().map(|m| m.record.id.clone()).collect()
    }

    #[test]
    fn agrees_with_linear_scan() {
        let records = grid_records();
        let index = RecordIndex::new(records.clone());
        let center = Coordinate::new(26.78, -80.05);

        for radius in [0.0, 0.1, 0.45, 1.0, 2.5, 5.0, 50.0] {
            let indexed = index.radius_search(&center, radius).unwrap();
            let linear = rtcc_geo::radius_search(&center, radius, &records).unwrap();
            assert_eq!(ids(&indexed), ids(&linear), "mismatch at radius {radius}");
        }

        let polar = vec![LocatedRecord::new(
            "polar",
            LocatedRecordKind::Sensor,
            Coordinate::new(84.999, 180.0),
        )];
        let polar_index = RecordIndex::new(polar.clone());
        let beyond_pole = Coordinate::new(95.0, 0.0);
        let indexed = polar_index.radius_search(&beyond_pole, 1.0).unwrap();
        let linear = rtcc_geo::radius_search(&beyond_pole, 1.0, &polar).unwrap();
        assert_eq!(ids(&linear), ["polar"]);
        assert_eq!(ids(&indexed), ids(&linear), "mismatch for out-of-range center");
    }

    #[test]
    fn includes_record_at_exact_position() {
        let records = grid_records();
        let target = records[37].coordinate;
        let index = RecordIndex::new(records);

        let matches = index.radius_search(&target, 0.0).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].record.id, "cam-2-7");
    }

    #[test]
    fn works_across_the_antimeridian() {
        let records = vec![
            LocatedRecord::new("east", LocatedRecordKind::Sensor, Coordinate::new(0.0, 179.999)),
            LocatedRecord::new("west", LocatedRecordKind::Sensor, Coordinate::new(0.0, -179.999)),
            LocatedRecord::new("far", LocatedRecordKind::Sensor, Coordinate::new(0.0, 170.0)),
        ];
        let index = RecordIndex::new(records);

        let matches = index
            .radius_search(&Coordinate::new(0.0, 180.0), 1.0)
            .unwrap();
        let mut found: Vec<_> = matches.iter().map(|m| m.record.id.as_str()).collect();
        found.sort_unstable();
        assert_eq!(found, ["east", "west"]);
    }

    #[test]
    fn out_of_range_records_are_still_checked() {
        let records = vec![
            LocatedRecord::new("ok", LocatedRecordKind::Hydrant, Coordinate::new(10.0, 10.0)),
            LocatedRecord::new("odd", LocatedRecordKind::Hydrant, Coordinate::new(10.0, 370.0)),
        ];
        let index = RecordIndex::new(records.clone());
        let center = Coordinate::new(10.0, 10.0);

        let indexed = index.radius_search(&center, 1.0).unwrap();
        let linear = rtcc_geo::radius_search(&center, 1.0, &records).unwrap();
        assert_eq!(ids(&indexed), ids(&linear));
    }

    #[test]
    fn negative_radius_is_invalid() {
        let index = RecordIndex::new(grid_records());
        let err = index
            .radius_search(&Coordinate::new(26.78, -80.05), -1.0)
            .unwrap_err();
        assert!(
            matches!(err, SpatialError::Geo(GeoError::InvalidArgument { .. })),
            "got {err:?}"
        );
    }

    #[test]
    fn empty_index() {
        let index: RecordIndex<LocatedRecord> = RecordIndex::new(Vec::new());
        assert!(index.is_empty());
        assert!(index
            .radius_search(&Coordinate::new(0.0, 0.0), 10.0)
            .unwrap()
            .is_empty());
    }
}
