//! Point-in-polygon sector membership.
//!
//! Polygons are plain vertex slices with longitude as x and latitude as y.
//! They may be open or explicitly closed; the edge from the last vertex
//! back to the first is always implied.

use rtcc_geo_models::{Coordinate, HasCoordinate};

use crate::GeoError;

/// Collinearity tolerance, in squared degrees, for the on-edge test.
const BOUNDARY_EPSILON: f64 = 1e-12;

/// Ray-casting containment test. Points on an edge or vertex count as
/// inside.
///
/// # Errors
///
/// Returns [`GeoError::InvalidArgument`] if `polygon` has fewer than 3
/// vertices.
pub fn point_in_polygon(
    point: &impl HasCoordinate,
    polygon: &[Coordinate],
) -> Result<bool, GeoError> {
    if polygon.len() < 3 {
        return Err(GeoError::invalid_argument(format!(
            "polygon needs at least 3 vertices, got {}",
            polygon.len()
        )));
    }

    let point = point.coordinate();
    let (x, y) = (point.longitude, point.latitude);

    let mut inside = false;
    let mut prev = polygon[polygon.len() - 1];

    for &vertex in polygon {
        if on_segment(point, prev, vertex) {
            return Ok(true);
        }

        let (xi, yi) = (vertex.longitude, vertex.latitude);
        let (xj, yj) = (prev.longitude, prev.latitude);

        // Half-open rule on y so a ray through a vertex counts once.
        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }

        prev = vertex;
    }

    Ok(inside)
}

/// Whether `point` lies on an edge or vertex of `polygon`.
///
/// The ring is treated as closed whether or not the last vertex repeats
/// the first. An empty ring has no boundary.
#[must_use]
pub fn point_on_boundary(point: &impl HasCoordinate, polygon: &[Coordinate]) -> bool {
    let Some(&last) = polygon.last() else {
        return false;
    };
    let point = point.coordinate();

    let mut prev = last;
    polygon.iter().any(|&vertex| {
        let hit = on_segment(point, prev, vertex);
        prev = vertex;
        hit
    })
}

/// Whether `point` lies on the segment `a`-`b`.
fn on_segment(point: Coordinate, a: Coordinate, b: Coordinate) -> bool {
    let (px, py) = (point.longitude, point.latitude);
    let (ax, ay) = (a.longitude, a.latitude);
    let (bx, by) = (b.longitude, b.latitude);

    let cross = (px - ax).mul_add(by - ay, -((py - ay) * (bx - ax)));
    if cross.abs() > BOUNDARY_EPSILON {
        return false;
    }

    px >= ax.min(bx) - BOUNDARY_EPSILON
        && px <= ax.max(bx) + BOUNDARY_EPSILON
        && py >= ay.min(by) - BOUNDARY_EPSILON
        && py <= ay.max(by) + BOUNDARY_EPSILON
}

/// Whether the first and last vertices are exactly equal.
#[must_use]
pub fn is_closed_polygon(polygon: &[Coordinate]) -> bool {
    match (polygon.first(), polygon.last()) {
        (Some(first), Some(last)) => first == last,
        _ => false,
    }
}

/// Returns a copy of `polygon` with the first vertex repeated at the end,
/// unless it is already closed or empty.
#[must_use]
pub fn close_polygon(polygon: &[Coordinate]) -> Vec<Coordinate> {
    let mut closed = polygon.to_vec();
    if !is_closed_polygon(polygon) {
        closed.extend(polygon.first().copied());
    }
    closed
}
