mod integrator;
mod machinery;
mod sample_buffer;
mod worker;

use std::num::NonZeroU32;

pub use integrator::{PathTracer, PixelEstimate, RUSSIAN_ROULETTE_CONTINUE};
pub use machinery::{Progress, RenderProgress, render};
pub use sample_buffer::SampleBuffer;

/// Estimator used for light arriving directly from light sources.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DirectLighting {
    /// Uniform directions around the normal, only finds emissive geometry
    Hemisphere,
    /// Samples taken toward the scene lights
    Importance,
}

#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    pub tile_size: NonZeroU32,
    /// Camera rays per pixel
    pub sample_count: NonZeroU32,
    /// Samples per area light, hemisphere sampling uses this many directions per light
    pub light_sample_count: NonZeroU32,
    pub direct_lighting: DirectLighting,
    /// 0 renders only emitted light, 1 adds direct lighting, more adds indirect bounces
    pub max_ray_depth: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            tile_size: const { NonZeroU32::new(32).unwrap() },
            sample_count: NonZeroU32::MIN,
            light_sample_count: NonZeroU32::MIN,
            direct_lighting: DirectLighting::Importance,
            max_ray_depth: 1,
        }
    }
}
