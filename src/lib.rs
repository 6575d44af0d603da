//! # Radial-volume library
//!
//! This crate reconstructs cartesian (X, Y, Z) volumes from radial stacks.
//!
//! Some optical instruments image a specimen while rotating it instead of
//! translating it. The result is a stack of slices indexed by height (H),
//! radial distance (R) and rotation angle (Theta). For every voxel of the
//! cartesian output the reconstruction computes the matching cylindrical
//! coordinate and samples the stack there with trilinear interpolation.
//! Positions outside the stack read as zero, except that a stack covering a
//! full revolution wraps around on its angle axis.
//!
//! The output is split into slabs along its longest axis and every slab is
//! filled by its own worker on a shared rayon thread pool. Progress is
//! averaged over the workers and reported about every 500ms, and running
//! reconstructions can be killed at any time.
//!
//! The axes of both volumes can come in any of six orders ([`AxisOrder`]).
//! The output has extents `2R x 2R x H`, with the rotation axis through the
//! center of every XY slice.
//!
//! # Examples
//!
//! ## Reconstructing a stack of 360 one-degree slices
//!
//! ```no_run
//! # use radial_volume::{AxisOrder, ReconstructionConfig, Reconstructor, Volume};
//! let stack = Volume::zeros([10, 50, 360], AxisOrder::HRTheta)
//!     .expect("should have allocated the stack");
//!
//! let mut reconstructor = Reconstructor::new(ReconstructionConfig::default())
//!     .expect("should have built the thread pool");
//! reconstructor.set_input_stack(stack);
//!
//! let volume = reconstructor
//!     .create_reconstruction(&|progress: f64| println!("{:.0}%", progress * 100.0))
//!     .expect("should have reconstructed the stack");
//! assert_eq!(volume.dim(), [100, 100, 10]);
//! ```
//!
//! ## Running in the background
//!
//! ```no_run
//! # use radial_volume::{ReconstructionCallback, ReconstructionProgress, Reconstructor, Volume};
//! # use radial_volume::error::Result;
//! struct Report;
//!
//! impl ReconstructionProgress for Report {
//!     fn progress_update(&self, progress: f64) {
//!         println!("{:.0}%", progress * 100.0);
//!     }
//! }
//!
//! impl ReconstructionCallback for Report {
//!     fn completed(&self, result: Result<Volume>) {
//!         match result {
//!             Ok(volume) => println!("done: {:?}", volume.dim()),
//!             Err(e) => println!("failed: {e}"),
//!         }
//!     }
//! }
//!
//! # fn run(reconstructor: &Reconstructor) {
//! reconstructor.start_reconstruction(Report);
//! # }
//! ```

pub mod chunk_planner;
pub mod chunk_worker;
pub mod config;
pub mod coordinates;
pub mod enums;
pub mod error;
pub mod interpolator;
pub mod progress;
pub mod reconstruction;
pub mod volume;

pub use config::ReconstructionConfig;
pub use enums::{Axis, AxisOrder};
pub use error::ReconstructionError;
pub use interpolator::{Extension, Sampler};
pub use progress::{ReconstructionCallback, ReconstructionEvent, ReconstructionProgress};
pub use reconstruction::{CancellationToken, Reconstructor};
pub use volume::Volume;
