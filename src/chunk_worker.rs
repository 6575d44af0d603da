use ndarray::ArrayViewMut3;

use crate::chunk_planner::ChunkBounds;
use crate::coordinates::{AxisMapping, to_cylindrical};
use crate::interpolator::Sampler;
use crate::progress::ChunkProgress;
use crate::reconstruction::CancellationToken;

/// Everything one worker needs to fill its chunk.
#[derive(Clone, Copy, Debug)]
pub struct ChunkTask<'a> {
    pub bounds: ChunkBounds,
    /// Rotation axis in destination `[x, y, z]`.
    pub origin: [f64; 3],
    pub angle_spacing: f64,
    pub mapping: AxisMapping,
    pub sampler: Sampler<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkOutcome {
    Completed,
    Cancelled,
}

pub struct ChunkWorker<'a, 'b> {
    task: ChunkTask<'a>,
    progress: &'b ChunkProgress,
    cancel: &'b CancellationToken,
}

impl<'a, 'b> ChunkWorker<'a, 'b> {
    pub fn new(
        task: ChunkTask<'a>,
        progress: &'b ChunkProgress,
        cancel: &'b CancellationToken,
    ) -> Self {
        Self {
            task,
            progress,
            cancel,
        }
    }

    /// Fill `output`, the part of the destination covered by the task's bounds.
    ///
    /// The cancellation token is polled before every voxel; a cancelled worker
    /// leaves the rest of its chunk untouched.
    pub fn run(self, mut output: ArrayViewMut3<'_, f32>) -> ChunkOutcome {
        let ChunkTask {
            bounds,
            origin,
            angle_spacing,
            mapping,
            sampler,
        } = self.task;
        debug_assert_eq!(
            output.dim(),
            (bounds.extent(0), bounds.extent(1), bounds.extent(2))
        );

        let mut done = 0;
        for ((i, j, k), voxel) in output.indexed_iter_mut() {
            if self.cancel.is_cancelled() {
                return ChunkOutcome::Cancelled;
            }

            let index = [bounds.min[0] + i, bounds.min[1] + j, bounds.min[2] + k];
            let h_r_theta = to_cylindrical(mapping.cartesian(index), origin, angle_spacing);
            *voxel = sampler.sample(mapping.source_position(h_r_theta));

            done += 1;
            self.progress.set_done(done);
        }

        ChunkOutcome::Completed
    }
}
