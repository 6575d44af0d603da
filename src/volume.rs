use crate::enums::{Axis, AxisOrder};
use crate::error::{ReconstructionError, Result};

use ndarray::{Array3, ArrayView2, ArrayView3, ArrayViewMut3, Axis as ArrayAxis};

/// Dense 3-D volume of `f32` samples.
///
/// The axis order tells which logical axis each array axis holds. Extents are
/// fixed at construction; mutable access is only handed out as a view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Volume {
    data: Array3<f32>,
    order: AxisOrder,
}

impl Volume {
    pub fn new(data: Array3<f32>, order: AxisOrder) -> Self {
        Self { data, order }
    }

    /// Allocate a zero-filled volume.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructionError::DimensionOverflow`] if the voxel count
    /// overflows and [`ReconstructionError::Allocation`] if the memory cannot
    /// be reserved.
    pub fn zeros(dim: [usize; 3], order: AxisOrder) -> Result<Self> {
        let voxels = dim
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(ReconstructionError::DimensionOverflow)?;

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(voxels)
            .map_err(|_| ReconstructionError::Allocation { voxels })?;
        samples.resize(voxels, 0.0);

        Self::from_shape_vec(dim, samples, order)
    }

    pub fn from_shape_vec(dim: [usize; 3], samples: Vec<f32>, order: AxisOrder) -> Result<Self> {
        let data = Array3::from_shape_vec((dim[0], dim[1], dim[2]), samples)?;
        Ok(Self::new(data, order))
    }

    /// Build a volume by evaluating `f` at every array index.
    pub fn from_shape_fn<F>(dim: [usize; 3], order: AxisOrder, mut f: F) -> Self
    where
        F: FnMut([usize; 3]) -> f32,
    {
        let data = Array3::from_shape_fn((dim[0], dim[1], dim[2]), |(i, j, k)| f([i, j, k]));
        Self::new(data, order)
    }

    /// Extents in array order.
    pub fn dim(&self) -> [usize; 3] {
        let (a, b, c) = self.data.dim();
        [a, b, c]
    }

    /// Extent along a logical axis.
    pub fn extent(&self, axis: Axis) -> usize {
        self.dim()[self.order.slot_of(axis)]
    }

    /// Logical axis held by each array axis.
    pub fn order(&self) -> AxisOrder {
        self.order
    }

    /// Backing array, indexed in array order.
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Read-only view for samplers.
    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// Writable view; extents cannot change through it.
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, f32> {
        self.data.view_mut()
    }

    /// Drop the axis order and keep the samples.
    pub fn into_data(self) -> Array3<f32> {
        self.data
    }

    /// Sample at an array index, `None` outside the volume.
    pub fn get(&self, index: [usize; 3]) -> Option<f32> {
        self.data.get(index).copied()
    }

    /// Set every voxel to `value`, in parallel.
    pub fn fill(&mut self, value: f32) {
        self.data.par_mapv_inplace(|_| value);
    }

    /// 2-D slice perpendicular to a logical axis, `None` if `index` is out of range.
    pub fn get_slice_from_axis(&self, index: usize, axis: Axis) -> Option<ArrayView2<'_, f32>> {
        if index >= self.extent(axis) {
            return None;
        }
        let slot = self.order.slot_of(axis);
        Some(self.data.index_axis(ArrayAxis(slot), index))
    }
}
