mod stats;

pub use stats::Stats;

use crate::geometry::FloatType;

/// Linear RGB radiance or reflectance.
pub type Color = nalgebra::Vector3<FloatType>;

pub type Rgba = rgb::RGBA<f32>;

/// Display gamma applied when converting radiance to 8 bit pixels.
pub const DISPLAY_GAMMA: FloatType = 2.2;

/// Converts linear radiance to a gamma encoded, opaque display color.
/// Channels are clamped to [0, 1], NaN turns into black.
pub fn color_to_rgba(color: &Color) -> Rgba {
    let encode = |x: FloatType| {
        if x > 0.0 {
            x.min(1.0).powf(1.0 / DISPLAY_GAMMA)
        } else {
            0.0
        }
    };
    Rgba::new(encode(color.x), encode(color.y), encode(color.z), 1.0)
}
