use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

use anyhow::anyhow;
use core_affinity::CoreId;

use crate::{
    camera::Camera,
    geometry::ScreenBlock,
    renderer::{PathTracer, RenderSettings, SampleBuffer, worker::Worker},
    scene::{Object, Scene},
    screen_block::ScreenBlockExt,
};

/// Number of finished and total tiles.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub finished: usize,
    pub total: usize,
}

/// Starts rendering in background threads, one per CPU core.
/// Callbacks get called from the worker threads when a tile gets started and finished.
pub fn render<
    O: Object + 'static,
    F1: Fn(ScreenBlock) + Send + Sync + 'static,
    F2: Fn(ScreenBlock, Progress) + Send + Sync + 'static,
>(
    scene: Scene<O>,
    camera: Camera,
    settings: RenderSettings,
    started_tile_callback: F1,
    finished_tile_callback: F2,
) -> anyhow::Result<RenderProgress<O>> {
    let resolution = camera.get_resolution();
    let state = Arc::new(RenderState {
        scene,
        camera,
        settings,

        buffer: Mutex::new(SampleBuffer::new(resolution)),

        tile_ordering: ScreenBlock::from_size(resolution).tile_ordering(settings.tile_size),
        next_tile_index: AtomicUsize::new(0),
        finished_tiles: AtomicUsize::new(0),
    });
    let started_tile_callback = Arc::new(started_tile_callback);
    let finished_tile_callback = Arc::new(finished_tile_callback);

    let cores = worker_cores();
    tracing::debug!(
        worker_count = cores.len(),
        tile_count = state.tile_ordering.len(),
        "starting render"
    );

    let threads = cores
        .into_iter()
        .enumerate()
        .map(|(worker_id, core)| {
            let state = Arc::clone(&state);
            let started_tile_callback = Arc::clone(&started_tile_callback);
            let finished_tile_callback = Arc::clone(&finished_tile_callback);

            thread::Builder::new()
                .name(format!("worker{worker_id}"))
                .spawn(move || {
                    if let Some(core) = core {
                        core_affinity::set_for_current(core);
                    }

                    let mut worker = Worker::new(worker_id, PathTracer::new(state.settings));

                    while let Some(tile) = state.get_next_tile() {
                        (started_tile_callback)(*tile);

                        let estimates = worker.render_tile(&state.scene, &state.camera, tile);
                        {
                            let mut buffer = state.lock_buffer();
                            for (point, estimate) in tile.internal_points().zip(estimates) {
                                buffer.update_pixel(estimate.radiance, point, estimate.sample_count);
                            }
                        }

                        let finished = state.finished_tiles.fetch_add(1, Ordering::AcqRel) + 1;
                        (finished_tile_callback)(
                            *tile,
                            Progress {
                                finished,
                                total: state.tile_ordering.len(),
                            },
                        );
                    }
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RenderProgress {
        render_state: state,
        threads,
    })
}

/// Cores to pin the workers to, unpinned workers if the core list is not available.
fn worker_cores() -> Vec<Option<CoreId>> {
    match core_affinity::get_core_ids() {
        Some(ids) if !ids.is_empty() => ids.into_iter().map(Some).collect(),
        _ => {
            tracing::warn!("CPU core list not available, worker threads will not be pinned");
            vec![None; num_cpus::get().max(1)]
        }
    }
}

pub struct RenderProgress<O: Object> {
    render_state: Arc<RenderState<O>>,
    threads: Vec<JoinHandle<()>>,
}

impl<O: Object> RenderProgress<O> {
    /// Return number of finished and total tiles.
    pub fn progress(&self) -> Progress {
        Progress {
            finished: self.render_state.finished_tiles.load(Ordering::Acquire),
            total: self.render_state.tile_ordering.len(),
        }
    }

    pub fn progress_percent(&self) -> f32 {
        let Progress { finished, total } = self.progress();
        if total == 0 {
            100.0
        } else {
            100.0 * (finished as f32) / (total as f32)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.threads.iter().all(|handle| handle.is_finished())
    }

    /// Signal the workers to abort.
    /// Any running workers will still finish their tiles, but no new ones will be started.
    pub fn abort(&self) {
        self.render_state
            .next_tile_index
            .store(self.render_state.tile_ordering.len(), Ordering::Release);
    }

    /// Blocks until all workers are finished.
    pub fn wait(&mut self) -> anyhow::Result<()> {
        for handle in self.threads.drain(..) {
            handle
                .join()
                .map_err(|_| anyhow!("Render worker thread panicked"))?;
        }

        tracing::debug!(progress = ?self.progress(), "render finished");
        Ok(())
    }

    pub fn buffer(&self) -> MutexGuard<'_, SampleBuffer> {
        self.render_state.lock_buffer()
    }

    pub fn scene(&self) -> &Scene<O> {
        &self.render_state.scene
    }
}

struct RenderState<O: Object> {
    scene: Scene<O>,
    camera: Camera,
    settings: RenderSettings,

    buffer: Mutex<SampleBuffer>,

    tile_ordering: Vec<ScreenBlock>,
    next_tile_index: AtomicUsize,
    finished_tiles: AtomicUsize,
}

impl<O: Object> RenderState<O> {
    fn get_next_tile(&self) -> Option<&ScreenBlock> {
        let id = self.next_tile_index.fetch_add(1, Ordering::AcqRel);
        self.tile_ordering.get(id)
    }

    /// A panicking worker can't leave a tile half written in a way that matters,
    /// so poisoning is ignored.
    fn lock_buffer(&self) -> MutexGuard<'_, SampleBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
