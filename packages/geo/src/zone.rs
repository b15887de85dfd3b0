//! Nearest-zone assignment against a fixed table of zone centers.
//!
//! Callers stamp the returned zone name onto their records right after
//! construction. A [`ZoneTable`] is immutable; services that reconfigure
//! zones at runtime hold a [`ZoneRegistry`] and swap whole tables.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use rtcc_geo_models::{Coordinate, HasCoordinate, ZoneAssignable, ZoneCenter, ZoneTableDef};

use crate::GeoError;
use crate::distance::haversine_distance_km;

/// Returns the name of the zone whose center is closest to `point`.
///
/// Ties go to the zone that appears first in `zones`.
///
/// # Errors
///
/// Returns [`GeoError::Configuration`] if `zones` is empty.
pub fn nearest_zone<'a>(
    point: &impl HasCoordinate,
    zones: &'a [ZoneCenter],
) -> Result<&'a str, GeoError> {
    nearest_zone_with_distance(point, zones).map(|(name, _)| name)
}

/// Same selection as [`nearest_zone`], also returning the distance to the
/// winning zone's center in kilometers.
///
/// # Errors
///
/// Returns [`GeoError::Configuration`] if `zones` is empty.
pub fn nearest_zone_with_distance<'a>(
    point: &impl HasCoordinate,
    zones: &'a [ZoneCenter],
) -> Result<(&'a str, f64), GeoError> {
    let mut best: Option<(&ZoneCenter, f64)> = None;

    for zone in zones {
        let distance = haversine_distance_km(point, &zone.center);
        match best {
            None => best = Some((zone, distance)),
            Some((_, best_distance)) if distance < best_distance => {
                best = Some((zone, distance));
            }
            _ => {}
        }
    }

    best.map(|(zone, distance)| (zone.name.as_str(), distance))
        .ok_or_else(|| GeoError::configuration("zone table is empty"))
}

/// An immutable, validated table of zone centers.
///
/// Guaranteed non-empty, with unique zone names and in-range centers.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneTable {
    id: String,
    name: String,
    zones: Vec<ZoneCenter>,
}

impl ZoneTable {
    /// Builds a table from zone centers. Table order is the tie-break
    /// order for [`nearest_zone`].
    ///
    /// # Errors
    ///
    /// * [`GeoError::Configuration`] if `zones` is empty or a name repeats
    /// * [`GeoError::InvalidCoordinate`] if a center is out of range
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        zones: Vec<ZoneCenter>,
    ) -> Result<Self, GeoError> {
        let id = id.into();

        if zones.is_empty() {
            return Err(GeoError::configuration(format!(
                "zone table '{id}' has no zones"
            )));
        }

        let mut seen = BTreeSet::new();
        for zone in &zones {
            if !seen.insert(zone.name.as_str()) {
                return Err(GeoError::configuration(format!(
                    "zone table '{id}' defines zone '{}' more than once",
                    zone.name
                )));
            }
            Coordinate::try_new(zone.center.latitude, zone.center.longitude)?;
        }

        Ok(Self {
            id,
            name: name.into(),
            zones,
        })
    }

    /// Builds a table from its TOML definition.
    ///
    /// # Errors
    ///
    /// See [`ZoneTable::new`].
    pub fn from_def(def: &ZoneTableDef) -> Result<Self, GeoError> {
        Self::new(
            def.id.clone(),
            def.name.clone(),
            def.zones.iter().map(ZoneCenter::from).collect(),
        )
    }

    /// Parses a table from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Toml`] on malformed TOML, otherwise see
    /// [`ZoneTable::new`].
    pub fn from_toml_str(toml_str: &str) -> Result<Self, GeoError> {
        let def: ZoneTableDef = toml::de::from_str(toml_str)?;
        Self::from_def(&def)
    }

    /// Reads and parses a table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Io`] if the file cannot be read, otherwise see
    /// [`ZoneTable::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, GeoError> {
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_toml_str(&contents)?;
        log::info!(
            "Loaded zone table '{}' ({} zones) from {}",
            table.id,
            table.zones.len(),
            path.display()
        );
        Ok(table)
    }

    /// Table identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zone centers in table order.
    #[must_use]
    pub fn zones(&self) -> &[ZoneCenter] {
        &self.zones
    }

    /// Number of zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the table has no zones. Never true for a constructed table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Looks up a zone by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ZoneCenter> {
        self.zones.iter().find(|z| z.name == name)
    }

    /// Nearest zone name for `point`.
    ///
    /// # Errors
    ///
    /// Only fails if the table is empty, which construction rules out.
    pub fn nearest(&self, point: &impl HasCoordinate) -> Result<&str, GeoError> {
        nearest_zone(point, &self.zones)
    }

    /// Stamps the nearest zone onto `record` and returns its name.
    ///
    /// # Errors
    ///
    /// See [`ZoneTable::nearest`].
    pub fn assign<R: ZoneAssignable + ?Sized>(&self, record: &mut R) -> Result<&str, GeoError> {
        let zone = nearest_zone(&record.coordinate(), &self.zones)?;
        record.set_assigned_zone(zone.to_string());
        Ok(zone)
    }

    /// Stamps the nearest zone onto every record. Returns how many records
    /// changed zone.
    ///
    /// # Errors
    ///
    /// See [`ZoneTable::nearest`].
    pub fn assign_all<R: ZoneAssignable>(&self, records: &mut [R]) -> Result<usize, GeoError> {
        let mut changed = 0;
        for record in records.iter_mut() {
            let zone = nearest_zone(&record.coordinate(), &self.zones)?;
            if record.assigned_zone() != Some(zone) {
                record.set_assigned_zone(zone.to_string());
                changed += 1;
            }
        }
        log::debug!(
            "Assigned zones from table '{}': {changed}/{} records changed",
            self.id,
            records.len()
        );
        Ok(changed)
    }
}

/// Holds the active [`ZoneTable`] for a service.
///
/// Readers take an `Arc` snapshot with [`ZoneRegistry::current`] and keep
/// using it even if the table is replaced concurrently. Replacement swaps
/// the whole table; entries are never edited in place.
#[derive(Debug)]
pub struct ZoneRegistry {
    active: RwLock<Arc<ZoneTable>>,
}

impl ZoneRegistry {
    /// Creates a registry with `table` active.
    #[must_use]
    pub fn new(table: ZoneTable) -> Self {
        log::info!(
            "Zone registry initialized with table '{}' ({} zones)",
            table.id,
            table.len()
        );
        Self {
            active: RwLock::new(Arc::new(table)),
        }
    }

    /// Snapshot of the active table.
    #[must_use]
    pub fn current(&self) -> Arc<ZoneTable> {
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Makes `table` active and returns the table it replaced.
    pub fn replace(&self, table: ZoneTable) -> Arc<ZoneTable> {
        let table = Arc::new(table);
        let previous = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *active, Arc::clone(&table))
        };
        log::info!(
            "Zone table '{}' replaced by '{}' ({} zones)",
            previous.id,
            table.id,
            table.len()
        );
        previous
    }

    /// Nearest zone name from the active table.
    ///
    /// # Errors
    ///
    /// See [`ZoneTable::nearest`].
    pub fn nearest(&self, point: &impl HasCoordinate) -> Result<String, GeoError> {
        self.current().nearest(point).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcc_geo_models::{LocatedRecord, LocatedRecordKind};

    fn example_zones() -> Vec<ZoneCenter> {
        vec![
            ZoneCenter::new("A", Coordinate::new(26.7753, -80.0589)),
            ZoneCenter::new("B", Coordinate::new(26.7912, -80.0345)),
        ]
    }

    #[test]
    fn picks_closest_zone() {
        let zones = example_zones();
        let point = Coordinate::new(26.776, -80.058);
        assert_eq!(nearest_zone(&point, &zones).unwrap(), "A");

        let (_, distance) = nearest_zone_with_distance(&point, &zones).unwrap();
        assert!(distance < 0.2, "distance to A was {distance} km");
    }

    #[test]
    fn nearest_zone_is_deterministic() {
        let zones = example_zones();
        let point = Coordinate::new(26.785, -80.045);
        let first = nearest_zone(&point, &zones).unwrap();
        for _ in 0..10 {
            assert_eq!(nearest_zone(&point, &zones).unwrap(), first);
        }
    }

    #[test]
    fn ties_go_to_first_zone() {
        let zones = vec![
            ZoneCenter::new("West", Coordinate::new(0.0, -1.0)),
            ZoneCenter::new("East", Coordinate::new(0.0, 1.0)),
        ];
        let origin = Coordinate::new(0.0, 0.0);
        assert_eq!(nearest_zone(&origin, &zones).unwrap(), "West");

        let reversed: Vec<_> = zones.into_iter().rev().collect();
        assert_eq!(nearest_zone(&origin, &reversed).unwrap(), "East");
    }

    #[test]
    fn duplicate_centers_resolve_to_first() {
        let center = Coordinate::new(26.7753, -80.0589);
        let zones = vec![ZoneCenter::new("First", center), ZoneCenter::new("Second", center)];
        assert_eq!(nearest_zone(&center, &zones).unwrap(), "First");
    }

    #[test]
    fn empty_table_is_a_configuration_error() {
        let err = nearest_zone(&Coordinate::new(26.78, -80.05), &[]).unwrap_err();
        assert!(matches!(err, GeoError::Configuration { .. }), "got {err:?}");
    }

    #[test]
    fn table_rejects_empty_duplicate_and_out_of_range() {
        assert!(matches!(
            ZoneTable::new("t", "T", vec![]),
            Err(GeoError::Configuration { .. })
        ));

        let mut dupes = example_zones();
        dupes.push(ZoneCenter::new("A", Coordinate::new(26.0, -80.0)));
        assert!(matches!(
            ZoneTable::new("t", "T", dupes),
            Err(GeoError::Configuration { .. })
        ));

        let bad = vec![ZoneCenter::new("Bad", Coordinate::new(91.0, 0.0))];
        assert!(matches!(
            ZoneTable::new("t", "T", bad),
            Err(GeoError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn table_from_toml() {
        let table = ZoneTable::from_toml_str(
            r#"
            id = "example"
            name = "Example"

            [[zones]]
            name = "A"
            latitude = 26.7753
            longitude = -80.0589

            [[zones]]
            name = "B"
            latitude = 26.7912
            longitude = -80.0345
            "#,
        )
        .unwrap();

        assert_eq!(table.id(), "example");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("B").unwrap().center.latitude, 26.7912);
        assert_eq!(table.nearest(&Coordinate::new(26.776, -80.058)).unwrap(), "A");
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = ZoneTable::from_toml_str("id = ").unwrap_err();
        assert!(matches!(err, GeoError::Toml(_)), "got {err:?}");
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join("rtcc_geo_zone_table_load.toml");
        std::fs::write(
            &path,
            "id = \"file\"\nname = \"File\"\n\n[[zones]]\nname = \"Only\"\nlatitude = 1.0\nlongitude = 2.0\n",
        )
        .unwrap();

        let table = ZoneTable::load(&path).unwrap();
        assert_eq!(table.id(), "file");
        assert_eq!(table.zones()[0].name, "Only");

        let _ = std::fs::remove_file(&path);

        let missing = std::env::temp_dir().join("rtcc_geo_zone_table_missing.toml");
        assert!(matches!(ZoneTable::load(&missing), Err(GeoError::Io(_))));
    }

    #[test]
    fn assign_stamps_records() {
        let table = ZoneTable::new("t", "T", example_zones()).unwrap();
        let mut records = vec![
            LocatedRecord::new("cam-1", LocatedRecordKind::Camera, Coordinate::new(26.776, -80.058)),
            LocatedRecord::new("hyd-1", LocatedRecordKind::Hydrant, Coordinate::new(26.7910, -80.0350)),
        ];

        assert_eq!(table.assign(&mut records[0]).unwrap(), "A");
        assert_eq!(records[0].assigned_zone.as_deref(), Some("A"));

        // cam-1 already carries its zone, so only hyd-1 changes.
        assert_eq!(table.assign_all(&mut records).unwrap(), 1);
        assert_eq!(records[1].assigned_zone.as_deref(), Some("B"));
        assert_eq!(table.assign_all(&mut records).unwrap(), 0);
    }

    #[test]
    fn registry_swaps_whole_tables() {
        let registry = ZoneRegistry::new(ZoneTable::new("v1", "V1", example_zones()).unwrap());
        let point = Coordinate::new(26.776, -80.058);

        let snapshot = registry.current();
        assert_eq!(registry.nearest(&point).unwrap(), "A");

        let replacement = ZoneTable::new(
            "v2",
            "V2",
            vec![ZoneCenter::new("Everything", Coordinate::new(26.0, -80.0))],
        )
        .unwrap();
        let previous = registry.replace(replacement);

        assert_eq!(previous.id(), "v1");
        assert_eq!(registry.current().id(), "v2");
        assert_eq!(registry.nearest(&point).unwrap(), "Everything");
        // Snapshots taken before the swap keep the old table.
        assert_eq!(snapshot.nearest(&point).unwrap(), "A");
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        let registry = Arc::new(ZoneRegistry::new(
            ZoneTable::new("v1", "V1", example_zones()).unwrap(),
        ));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let zone = registry.nearest(&Coordinate::new(26.776, -80.058)).unwrap();
                    assert!(zone == "A" || zone == "Z");
                })
            })
            .collect();

        registry.replace(ZoneTable::new(
            "v2",
            "V2",
            vec![ZoneCenter::new("Z", Coordinate::new(0.0, 0.0))],
        )
        .unwrap());

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
