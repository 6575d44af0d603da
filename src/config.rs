use std::thread;
use std::time::Duration;

use crate::enums::AxisOrder;
use crate::error::{ReconstructionError, Result};

pub const DEFAULT_ANGLE_SPACING: f64 = 1.0;
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Settings of one reconstruction.
///
/// Every job works on its own copy, so changing the settings of a
/// [`Reconstructor`](crate::reconstruction::Reconstructor) never affects
/// jobs already running.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructionConfig {
    /// Degrees between two successive slices of the radial stack.
    pub angle_spacing: f64,
    /// Physical axis order of the radial stack.
    pub source_order: AxisOrder,
    /// Physical axis order of the reconstruction, with `R`, `Theta` and `H`
    /// standing for X, Y and Z.
    pub destination_order: AxisOrder,
    /// Number of chunks, and of pool threads for a new reconstructor.
    pub worker_count: usize,
    pub progress_interval: Duration,
    /// Wrap the angle axis when the stack covers a full revolution, instead
    /// of reading zeros past the last slice.
    pub periodic_angle: bool,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            angle_spacing: DEFAULT_ANGLE_SPACING,
            source_order: AxisOrder::HRTheta,
            destination_order: AxisOrder::RThetaH,
            worker_count: thread::available_parallelism().map_or(1, |n| n.get()),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            periodic_angle: true,
        }
    }
}

impl ReconstructionConfig {
    pub fn with_angle_spacing(mut self, degrees: f64) -> Self {
        self.angle_spacing = degrees;
        self
    }

    pub fn with_source_order(mut self, order: AxisOrder) -> Self {
        self.source_order = order;
        self
    }

    pub fn with_destination_order(mut self, order: AxisOrder) -> Self {
        self.destination_order = order;
        self
    }

    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_periodic_angle(mut self, periodic: bool) -> Self {
        self.periodic_angle = periodic;
        self
    }

    /// # Errors
    ///
    /// [`ReconstructionError::InvalidSpacing`] unless the spacing is finite and
    /// positive, [`ReconstructionError::InvalidWorkerCount`] for zero workers.
    pub fn validate(&self) -> Result<()> {
        if !self.angle_spacing.is_finite() || self.angle_spacing <= 0.0 {
            return Err(ReconstructionError::InvalidSpacing(self.angle_spacing));
        }
        if self.worker_count == 0 {
            return Err(ReconstructionError::InvalidWorkerCount);
        }
        Ok(())
    }
}
