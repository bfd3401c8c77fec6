mod camera;
pub mod geometry;
pub mod renderer;
pub mod sampling;
pub mod scene;
mod screen_block;
pub mod util;

pub use crate::renderer::{
    DirectLighting, PathTracer, RenderProgress, RenderSettings, SampleBuffer, render,
};
pub use camera::Camera;
pub use scene::{Scene, SceneBuilder, SceneError};
pub use screen_block::ScreenBlockExt;
