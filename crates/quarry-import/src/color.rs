//! Linear to sRGB transfer curve

/// Values at or below this use the linear segment of the curve
pub const SRGB_LINEAR_THRESHOLD: f32 = 0.003_130_8;

/// Encode one linear channel in `0..=1` with the sRGB transfer function
pub fn rgb_to_srgb(c: f32) -> f32 {
    if c > SRGB_LINEAR_THRESHOLD {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * c
    }
}
