//! Point-in-geometry tests for click hit-testing, in lon/lat space.

use plume_shared::Geometry;

/// Even-odd ray cast over one ring.
fn ring_contains(ring: &[[f64; 2]], pos: [f64; 2]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if ((yi > pos[1]) != (yj > pos[1]))
            && (pos[0] < (xj - xi) * (pos[1] - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Even-odd over all rings, so holes punch out naturally.
pub fn polygon_contains(rings: &[Vec<[f64; 2]>], pos: [f64; 2]) -> bool {
    rings
        .iter()
        .filter(|ring| ring_contains(ring, pos))
        .count()
        % 2
        == 1
}

pub fn multipolygon_contains(polygons: &[Vec<Vec<[f64; 2]>>], pos: [f64; 2]) -> bool {
    polygons.iter().any(|rings| polygon_contains(rings, pos))
}

/// Containment test for area geometries; point geometries always miss here
/// (their hit radius is screen-space, handled by the canvas).
pub fn geometry_contains(geometry: &Geometry, pos: [f64; 2]) -> bool {
    match geometry {
        Geometry::Point { .. } => false,
        Geometry::Polygon { coordinates } => polygon_contains(coordinates, pos),
        Geometry::MultiPolygon { coordinates } => multipolygon_contains(coordinates, pos),
    }
}
