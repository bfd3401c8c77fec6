use rand::{SeedableRng, rngs::SmallRng};

use crate::{
    camera::Camera,
    geometry::ScreenBlock,
    scene::{Object, Scene},
    screen_block::ScreenBlockExt as _,
};

use super::{PathTracer, PixelEstimate};

pub struct Worker {
    rng: SmallRng,
    tracer: PathTracer,
    /// Estimates of the current tile, in the order of `ScreenBlock::internal_points`
    buffer: Vec<PixelEstimate>,
}

impl Worker {
    pub fn new(worker_id: usize, tracer: PathTracer) -> Self {
        tracing::trace!(worker_id, "starting worker");
        Self {
            rng: SmallRng::from_os_rng(),
            tracer,
            buffer: Vec::new(),
        }
    }

    pub fn render_tile<O: Object>(
        &mut self,
        scene: &Scene<O>,
        camera: &Camera,
        tile: &ScreenBlock,
    ) -> &[PixelEstimate] {
        self.buffer.clear();
        for point in tile.internal_points() {
            let estimate = self.tracer.raytrace_pixel(scene, camera, point, &mut self.rng);
            self.buffer.push(estimate);
        }
        &self.buffer
    }
}
