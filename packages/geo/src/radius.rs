//! Radius-bounded proximity search over located records.

use rtcc_geo_models::HasCoordinate;
use serde::Serialize;

use crate::GeoError;
use crate::distance::haversine_distance_km;

/// A record matched by a proximity query, with its distance from the
/// query center.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusMatch<'a, T> {
    /// The matched record.
    pub record: &'a T,
    /// Great-circle distance from the query center in kilometers.
    pub distance_km: f64,
}

impl<T> Clone for RadiusMatch<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RadiusMatch<'_, T> {}

/// Rejects negative and NaN radii.
///
/// # Errors
///
/// Returns [`GeoError::InvalidArgument`] if `radius_km` is negative or NaN.
pub fn validate_radius(radius_km: f64) -> Result<(), GeoError> {
    if radius_km.is_nan() || radius_km < 0.0 {
        return Err(GeoError::invalid_argument(format!(
            "radius must be a non-negative number of kilometers, got {radius_km}"
        )));
    }
    Ok(())
}

/// Returns every record within `radius_km` of `center` (inclusive),
/// nearest first. Records at equal distance keep their input order.
///
/// # Errors
///
/// Returns [`GeoError::InvalidArgument`] if `radius_km` is negative or NaN.
pub fn radius_search<'a, T: HasCoordinate>(
    center: &impl HasCoordinate,
    radius_km: f64,
    records: &'a [T],
) -> Result<Vec<RadiusMatch<'a, T>>, GeoError> {
    validate_radius(radius_km)?;

    let mut matches: Vec<_> = records
        .iter()
        .filter_map(|record| {
            let distance_km = haversine_distance_km(center, record);
            (distance_km <= radius_km).then_some(RadiusMatch {
                record,
                distance_km,
            })
        })
        .collect();

    sort_by_distance(&mut matches);

    log::debug!(
        "radius_search: {}/{} records within {radius_km} km",
        matches.len(),
        records.len()
    );

    Ok(matches)
}

/// Returns the `n` records closest to `center`, nearest first, with no
/// distance limit.
#[must_use]
pub fn nearest_n<'a, T: HasCoordinate>(
    center: &impl HasCoordinate,
    n: usize,
    records: &'a [T],
) -> Vec<RadiusMatch<'a, T>> {
    let mut matches: Vec<_> = records
        .iter()
        .map(|record| RadiusMatch {
            record,
            distance_km: haversine_distance_km(center, record),
        })
        .collect();

    sort_by_distance(&mut matches);
    matches.truncate(n);
    matches
}

/// Stable ascending sort by distance.
pub fn sort_by_distance<T>(matches: &mut [RadiusMatch<'_, T>]) {
    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
}
