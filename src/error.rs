use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconstructionError {
    #[error("No input stack has been set")]
    MissingInput,

    #[error("Invalid axis order: {0}")]
    InvalidOrder(String),

    #[error("Angle spacing must be a finite number of degrees greater than zero, got {0}")]
    InvalidSpacing(f64),

    #[error("Worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("Could not allocate a volume of {voxels} voxels")]
    Allocation { voxels: usize },

    #[error("Volume dimensions overflow")]
    DimensionOverflow,

    #[error("Reconstruction was cancelled")]
    Cancelled,

    #[error("A reconstruction worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, ReconstructionError>;
