/// Inclusive bounding box of one chunk in destination array indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkBounds {
    pub min: [usize; 3],
    pub max: [usize; 3],
}

impl ChunkBounds {
    pub fn extent(&self, axis: usize) -> usize {
        self.max[axis] - self.min[axis] + 1
    }

    pub fn voxel_count(&self) -> usize {
        (0..3).map(|axis| self.extent(axis)).product()
    }

    pub fn contains(&self, index: [usize; 3]) -> bool {
        (0..3).all(|axis| self.min[axis] <= index[axis] && index[axis] <= self.max[axis])
    }
}

/// Splits a destination volume into contiguous slabs, one per worker.
#[derive(Clone, Copy, Debug)]
pub struct ChunkPlanner {
    workers: usize,
}

impl ChunkPlanner {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Longest axis of `dim`; the first one wins a tie.
    pub fn split_axis(dim: [usize; 3]) -> usize {
        (0..3).fold(0, |best, axis| if dim[axis] > dim[best] { axis } else { best })
    }

    /// Slabs along the longest axis of `dim`, each spanning the full range of
    /// the other two axes.
    ///
    /// Every slab is `extent / n` wide and the last one also takes the
    /// remainder. When the split axis is shorter than the worker count only
    /// `extent` slabs of width 1 are made. An empty volume has no slabs.
    pub fn plan(&self, dim: [usize; 3]) -> Vec<ChunkBounds> {
        if dim.contains(&0) {
            return Vec::new();
        }

        let axis = Self::split_axis(dim);
        let extent = dim[axis];
        let count = self.workers.min(extent);
        let width = extent / count;
        let full_max = dim.map(|d| d - 1);

        (0..count)
            .map(|i| {
                let mut min = [0; 3];
                let mut max = full_max;
                min[axis] = i * width;
                max[axis] = if i + 1 == count {
                    extent - 1
                } else {
                    (i + 1) * width - 1
                };
                ChunkBounds { min, max }
            })
            .collect()
    }
}
