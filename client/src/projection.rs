use std::f64::consts::PI;

use plume_shared::Bounds;

/// World space is the Web Mercator square in zoom-0 pixel units: both axes
/// run 0..WORLD_SIZE, y growing south. Tile math and the viewport share it.
pub const WORLD_SIZE: f64 = 256.0;

/// Latitude beyond which the mercator projection diverges.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Project lon/lat (degrees) into world coordinates.
pub fn project(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let sin = lat.to_radians().sin();
    let y = 0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI);
    (x * WORLD_SIZE, y * WORLD_SIZE)
}

/// Inverse of [`project`].
pub fn unproject(wx: f64, wy: f64) -> (f64, f64) {
    let lon = wx / WORLD_SIZE * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * wy / WORLD_SIZE);
    let lat = (2.0 * n.exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// Project a lon/lat bounding box into a world-space box
/// `(min_wx, min_wy, max_wx, max_wy)`. North edge maps to min_wy.
pub fn project_bounds(bounds: Bounds) -> (f64, f64, f64, f64) {
    let (min_x, min_y, max_x, max_y) = bounds;
    let (min_wx, max_wy) = project(min_x, min_y);
    let (max_wx, min_wy) = project(max_x, max_y);
    (min_wx, min_wy, max_wx, max_wy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn origin_projects_to_world_center() {
        let (wx, wy) = project(0.0, 0.0);
        assert_close(wx, WORLD_SIZE / 2.0);
        assert_close(wy, WORLD_SIZE / 2.0);
    }

    #[test]
    fn north_is_up() {
        let (_, wy) = project(0.0, 60.0);
        assert!(wy < WORLD_SIZE / 2.0);
    }

    #[test]
    fn roundtrip() {
        let (wx, wy) = project(58.094, 56.124);
        let (lon, lat) = unproject(wx, wy);
        assert_close(lon, 58.094);
        assert_close(lat, 56.124);
    }

    #[test]
    fn poles_are_clamped() {
        let (_, wy) = project(0.0, 90.0);
        assert!(wy.is_finite());
        // The clamp latitude is the top edge of the mercator square.
        assert!(wy.abs() < 1e-6);
    }

    #[test]
    fn bounds_projection_flips_vertical_order() {
        let (min_wx, min_wy, max_wx, max_wy) = project_bounds((10.0, 50.0, 20.0, 60.0));
        assert!(min_wx < max_wx);
        assert!(min_wy < max_wy);
        // The north edge (lat 60) is the smaller world y.
        let (_, north_wy) = project(10.0, 60.0);
        assert_close(min_wy, north_wy);
    }
}
