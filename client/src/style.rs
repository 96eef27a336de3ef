//! Paint rules for the three dispersion layers.

/// Fill alpha for concentration cells with a non-zero value. Zero-valued
/// cells are fully transparent so the basemap shows through clean air.
pub const FILL_OPACITY: f64 = 0.7;

/// Discrete concentration ramp stops `(value, rgb)`; colors between stops
/// are linearly interpolated, values outside clamp to the end stops.
const RAMP: &[(f64, [u8; 3])] = &[
    (0.0, [0xff, 0xff, 0xff]),
    (0.000_000_1, [0xff, 0xff, 0xcc]),
    (1.0, [0xff, 0xed, 0xa0]),
    (5.0, [0xfe, 0xb2, 0x4c]),
    (10.0, [0xf0, 0x3b, 0x20]),
];

pub const POINT_SOURCE_COLOR: &str = "#ff0000";
pub const CADASTRE_SOURCE_COLOR: &str = "#0000ff";
pub const SOURCE_STROKE_COLOR: &str = "#ffffff";
pub const SOURCE_RADIUS_PX: f64 = 8.0;
pub const SOURCE_STROKE_PX: f64 = 2.0;

/// CSS rgba() string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r}, {g}, {b}, {a:.2})")
}

pub fn fill_opacity(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { FILL_OPACITY }
}

/// Concentration color from the ramp.
pub fn ramp_color(value: f64) -> [u8; 3] {
    let (first_stop, first_color) = RAMP[0];
    if !value.is_finite() || value <= first_stop {
        return first_color;
    }
    for window in RAMP.windows(2) {
        let (lo, lo_color) = window[0];
        let (hi, hi_color) = window[1];
        if value <= hi {
            let t = (value - lo) / (hi - lo);
            return [
                lerp_channel(lo_color[0], hi_color[0], t),
                lerp_channel(lo_color[1], hi_color[1], t),
                lerp_channel(lo_color[2], hi_color[2], t),
            ];
        }
    }
    RAMP[RAMP.len() - 1].1
}

/// Full CSS fill style for a concentration value (ramp color + opacity rule).
pub fn concentration_fill(value: f64) -> String {
    let [r, g, b] = ramp_color(value);
    rgba_css(r, g, b, fill_opacity(value))
}

fn lerp_channel(lo: u8, hi: u8, t: f64) -> u8 {
    (lo as f64 + (hi as f64 - lo as f64) * t).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_is_fully_transparent() {
        assert_eq!(fill_opacity(0.0), 0.0);
        assert_eq!(concentration_fill(0.0), "rgba(255, 255, 255, 0.00)");
    }

    #[test]
    fn nonzero_value_uses_the_fixed_opacity() {
        assert_eq!(fill_opacity(5.0), 0.7);
        assert_eq!(fill_opacity(0.000_1), 0.7);
    }

    #[test]
    fn ramp_hits_the_exact_stops() {
        assert_eq!(ramp_color(1.0), [0xff, 0xed, 0xa0]);
        assert_eq!(ramp_color(5.0), [0xfe, 0xb2, 0x4c]);
        assert_eq!(ramp_color(10.0), [0xf0, 0x3b, 0x20]);
    }

    #[test]
    fn ramp_interpolates_between_stops() {
        let mid = ramp_color(3.0);
        // Halfway between the 1.0 and 5.0 stops.
        assert_eq!(mid, [0xff, 0xd0, 0x76]);
    }

    #[test]
    fn ramp_clamps_outside_the_stops() {
        assert_eq!(ramp_color(-1.0), [0xff, 0xff, 0xff]);
        assert_eq!(ramp_color(1000.0), [0xf0, 0x3b, 0x20]);
        assert_eq!(ramp_color(f64::NAN), [0xff, 0xff, 0xff]);
    }

    #[test]
    fn high_value_fill_is_opaque_red() {
        assert_eq!(concentration_fill(10.0), "rgba(240, 59, 32, 0.70)");
    }
}
