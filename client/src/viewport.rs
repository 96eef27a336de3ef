/// Viewport manages the pan/zoom transformation from mercator world
/// coordinates (see `projection`) to screen pixels.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    /// Screen pixels per world unit; log2(scale) is the slippy zoom level.
    pub scale: f64,
}

const MIN_SCALE: f64 = 1.0;
const MAX_SCALE: f64 = (1u32 << 20) as f64;
const ZOOM_SENSITIVITY: f64 = 0.001;

/// Screen padding kept around fitted data.
const FIT_PADDING_PX: f64 = 60.0;
/// Fitting never zooms in past slippy zoom 18.
const MAX_FIT_SCALE: f64 = (1u32 << 18) as f64;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: MIN_SCALE,
        }
    }
}

impl Viewport {
    /// Convert world coordinates to screen coordinates.
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            wy * self.scale + self.offset_y,
        )
    }

    /// Convert screen coordinates to world coordinates.
    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// World-space box currently visible on a canvas of the given size.
    pub fn visible_world_bounds(&self, canvas_w: f64, canvas_h: f64) -> (f64, f64, f64, f64) {
        let (min_wx, min_wy) = self.screen_to_world(0.0, 0.0);
        let (max_wx, max_wy) = self.screen_to_world(canvas_w, canvas_h);
        (min_wx, min_wy, max_wx, max_wy)
    }

    /// Zoom toward a focus point (screen coordinates).
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;

        // Adjust offset so the point under the cursor stays fixed
        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
    }

    /// Pan by screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Fit the viewport to the given world-coordinate box with fixed screen
    /// padding. A degenerate box (single point) centers at maximum fit zoom.
    pub fn fit_bounds(
        &mut self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        canvas_w: f64,
        canvas_h: f64,
    ) {
        if canvas_w <= 0.0 || canvas_h <= 0.0 || min_x > max_x || min_y > max_y {
            return;
        }

        let world_w = max_x - min_x;
        let world_h = max_y - min_y;
        let usable_w = (canvas_w - 2.0 * FIT_PADDING_PX).max(1.0);
        let usable_h = (canvas_h - 2.0 * FIT_PADDING_PX).max(1.0);

        self.scale = if world_w > 0.0 || world_h > 0.0 {
            let scale_x = if world_w > 0.0 { usable_w / world_w } else { f64::MAX };
            let scale_y = if world_h > 0.0 { usable_h / world_h } else { f64::MAX };
            scale_x.min(scale_y).clamp(MIN_SCALE, MAX_FIT_SCALE)
        } else {
            MAX_FIT_SCALE
        };

        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;
        self.offset_x = canvas_w / 2.0 - center_x * self.scale;
        self.offset_y = canvas_h / 2.0 - center_y * self.scale;
    }
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
    fn screen_world_roundtrip() {
        let vp = Viewport {
            offset_x: 40.0,
            offset_y: -12.0,
            scale: 3.0,
        };
        let (wx, wy) = vp.screen_to_world(100.0, 200.0);
        let (sx, sy) = vp.world_to_screen(wx, wy);
        assert_close(sx, 100.0);
        assert_close(sy, 200.0);
    }

    #[test]
    fn zoom_keeps_focus_point_fixed() {
        let mut vp = Viewport {
            offset_x: 10.0,
            offset_y: 10.0,
            scale: 4.0,
        };
        let (wx, wy) = vp.screen_to_world(320.0, 240.0);
        vp.zoom_at(-240.0, 320.0, 240.0);
        let (wx2, wy2) = vp.screen_to_world(320.0, 240.0);
        assert_close(wx2, wx);
        assert_close(wy2, wy);
        assert!(vp.scale > 4.0);
    }

    #[test]
    fn fit_bounds_centers_the_box() {
        let mut vp = Viewport::default();
        vp.fit_bounds(10.0, 20.0, 30.0, 40.0, 800.0, 600.0);
        let (sx, sy) = vp.world_to_screen(20.0, 30.0);
        assert_close(sx, 400.0);
        assert_close(sy, 300.0);
    }

    #[test]
    fn fit_bounds_respects_padding() {
        let mut vp = Viewport::default();
        vp.fit_bounds(0.0, 0.0, 1e-3, 1e-3, 800.0, 600.0);
        // Tiny box: clamped to max fit zoom rather than exploding.
        assert_close(vp.scale, (1u32 << 18) as f64);
    }

    #[test]
    fn fit_bounds_handles_a_single_point() {
        let mut vp = Viewport::default();
        vp.fit_bounds(5.0, 5.0, 5.0, 5.0, 800.0, 600.0);
        let (sx, sy) = vp.world_to_screen(5.0, 5.0);
        assert_close(sx, 400.0);
        assert_close(sy, 300.0);
        assert!(vp.scale > 1.0);
    }

    #[test]
    fn visible_bounds_cover_the_canvas() {
        let vp = Viewport {
            offset_x: -100.0,
            offset_y: -50.0,
            scale: 2.0,
        };
        let (min_wx, min_wy, max_wx, max_wy) = vp.visible_world_bounds(800.0, 600.0);
        assert_close(min_wx, 50.0);
        assert_close(min_wy, 25.0);
        assert_close(max_wx, 450.0);
        assert_close(max_wy, 325.0);
    }
}
