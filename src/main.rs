use futures::StreamExt;
use radial_volume::{
    AxisOrder, ReconstructionConfig, ReconstructionEvent, Reconstructor, Volume, enums::Axis,
};

const HEIGHT: usize = 32;
const RADIUS: usize = 128;
const ANGLE_SPACING: f64 = 2.0;

/// Radial stack of a hollow tube whose wall lies between radius 40 and 60.
fn tube_stack() -> Volume {
    let angles = (360.0 / ANGLE_SPACING) as usize;
    Volume::from_shape_fn([HEIGHT, RADIUS, angles], AxisOrder::HRTheta, |[_, r, _]| {
        if (40..60).contains(&r) { 1.0 } else { 0.0 }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let config = ReconstructionConfig::default().with_angle_spacing(ANGLE_SPACING);
    let mut reconstructor =
        Reconstructor::new(config).expect("should have created the reconstructor");
    reconstructor.set_input_stack(tube_stack());

    let (tx, mut events) = futures::channel::mpsc::unbounded::<ReconstructionEvent>();
    reconstructor.start_reconstruction(tx);

    let mut result = None;
    while let Some(event) = events.next().await {
        match event {
            ReconstructionEvent::Progress(progress) => {
                log::info!("Progress: {:.0}%", progress * 100.0)
            }
            ReconstructionEvent::Completed(outcome) => result = Some(outcome),
        }
    }
    let volume = result
        .expect("should have received a completion event")
        .expect("should have reconstructed the stack");

    let slice = volume
        .get_slice_from_axis(volume.extent(Axis::Height) / 2, Axis::Height)
        .expect("should have returned the central slice");
    let filled = slice.iter().filter(|&&v| v > 0.5).count();
    log::info!(
        "Reconstructed {:?}; central slice has {} of {} voxels inside the tube wall",
        volume.dim(),
        filled,
        slice.len()
    );
}
