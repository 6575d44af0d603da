use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use futures::StreamExt;
use log::{debug, error, info, warn};
use ndarray::Axis as ArrayAxis;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use web_time::Instant;

use crate::chunk_planner::{ChunkBounds, ChunkPlanner};
use crate::chunk_worker::{ChunkOutcome, ChunkTask, ChunkWorker};
use crate::config::ReconstructionConfig;
use crate::coordinates::AxisMapping;
use crate::enums::AxisOrder;
use crate::error::{ReconstructionError, Result};
use crate::interpolator::{Extension, Sampler};
use crate::progress::{
    JobProgress, ReconstructionCallback, ReconstructionEvent, ReconstructionProgress,
    run_progress_timer,
};
use crate::volume::Volume;

/// Shared flag telling workers to stop.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Reconstructs cartesian volumes from radial stacks.
///
/// Chunk fills of every job, synchronous or not, run on one thread pool
/// created with the reconstructor. Cloning gives another handle on the same
/// pool and cancellation state with its own copy of the settings.
#[derive(Clone, Debug)]
pub struct Reconstructor {
    config: ReconstructionConfig,
    source: Option<Arc<Volume>>,
    pool: Arc<ThreadPool>,
    cancel: Arc<Mutex<CancellationToken>>,
    next_job: Arc<AtomicU64>,
}

impl Reconstructor {
    /// Create a reconstructor with a pool of `config.worker_count` threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the pool cannot be
    /// built.
    pub fn new(config: ReconstructionConfig) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_count)
            .thread_name(|i| format!("radial-worker-{i}"))
            .build()?;

        Ok(Self {
            config,
            source: None,
            pool: Arc::new(pool),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            next_job: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Set the radial stack to reconstruct. Its axis order becomes the
    /// source order.
    pub fn set_input_stack(&mut self, stack: impl Into<Arc<Volume>>) {
        let stack = stack.into();
        self.config.source_order = stack.order();
        self.source = Some(stack);
    }

    pub fn input_stack(&self) -> Option<&Volume> {
        self.source.as_deref()
    }

    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Degrees between two successive slices of the stack.
    ///
    /// # Errors
    ///
    /// [`ReconstructionError::InvalidSpacing`]; the previous value is kept.
    pub fn set_angle_spacing(&mut self, degrees: f64) -> Result<()> {
        self.config.clone().with_angle_spacing(degrees).validate()?;
        self.config.angle_spacing = degrees;
        Ok(())
    }

    pub fn angle_spacing(&self) -> f64 {
        self.config.angle_spacing
    }

    pub fn set_source_order(&mut self, order: AxisOrder) {
        self.config.source_order = order;
    }

    pub fn source_order(&self) -> AxisOrder {
        self.config.source_order
    }

    pub fn set_destination_order(&mut self, order: AxisOrder) {
        self.config.destination_order = order;
    }

    pub fn destination_order(&self) -> AxisOrder {
        self.config.destination_order
    }

    /// Number of chunks per job. The pool size is fixed at construction.
    ///
    /// # Errors
    ///
    /// [`ReconstructionError::InvalidWorkerCount`] for zero.
    pub fn set_worker_count(&mut self, workers: usize) -> Result<()> {
        if workers == 0 {
            return Err(ReconstructionError::InvalidWorkerCount);
        }
        self.config.worker_count = workers;
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    pub fn set_progress_interval(&mut self, interval: Duration) {
        self.config.progress_interval = interval;
    }

    /// Reconstruct the input stack, blocking until done.
    ///
    /// # Errors
    ///
    /// [`ReconstructionError::MissingInput`] if no stack is set, plus every
    /// error of [`Reconstructor::reconstruct_volume`].
    pub fn create_reconstruction(&self, progress: &dyn ReconstructionProgress) -> Result<Volume> {
        let source = self
            .source
            .as_deref()
            .ok_or(ReconstructionError::MissingInput)?;
        self.reconstruct_volume(source, &self.config, progress)
    }

    /// Reconstruct `source` with the given settings, blocking until done.
    ///
    /// `config.source_order` decides how `source` is read, whatever its own
    /// order tag says.
    ///
    /// # Errors
    ///
    /// Invalid settings, allocation failure, a panicking worker, or
    /// [`ReconstructionError::Cancelled`] after
    /// [`Reconstructor::kill_all_reconstructions`].
    pub fn reconstruct_volume(
        &self,
        source: &Volume,
        config: &ReconstructionConfig,
        progress: &dyn ReconstructionProgress,
    ) -> Result<Volume> {
        let job = Job {
            id: self.next_job_id(),
            pool: &self.pool,
            cancel: self.current_token(),
        };
        job.run(source, config, progress)
    }

    /// Reconstruct the input stack in the background.
    ///
    /// Returns immediately; progress and the result, including every error,
    /// are delivered to `callback`. The settings and stack are captured now,
    /// so later changes do not affect this job.
    pub fn start_reconstruction<C>(&self, callback: C)
    where
        C: ReconstructionCallback + 'static,
    {
        let id = self.next_job_id();
        let callback = Arc::new(callback);
        let job_callback = Arc::clone(&callback);
        let source = self.source.clone();
        let config = self.config.clone();
        let pool = Arc::clone(&self.pool);
        let cancel = self.current_token();

        let spawned = thread::Builder::new()
            .name(format!("radial-job-{id}"))
            .spawn(move || {
                let result = match source {
                    Some(source) => {
                        let job = Job {
                            id,
                            pool: &pool,
                            cancel,
                        };
                        job.run(&source, &config, job_callback.as_ref())
                    }
                    None => Err(ReconstructionError::MissingInput),
                };

                match &result {
                    Ok(_) | Err(ReconstructionError::Cancelled) => {}
                    Err(e) => error!("Reconstruction job {id} failed: {e}"),
                }
                job_callback.completed(result);
            });

        if let Err(e) = spawned {
            error!("Could not start reconstruction job {id}: {e}");
            callback.completed(Err(e.into()));
        }
    }

    /// Reconstruct the input stack in the background and wait for the result.
    pub async fn reconstruct(&self) -> Result<Volume> {
        let (tx, mut rx) = futures::channel::mpsc::unbounded::<ReconstructionEvent>();
        self.start_reconstruction(tx);

        while let Some(event) = rx.next().await {
            if let ReconstructionEvent::Completed(result) = event {
                return result;
            }
        }
        Err(ReconstructionError::Cancelled)
    }

    /// Stop every running reconstruction of this reconstructor and its
    /// clones. Jobs started afterwards are not affected.
    pub fn kill_all_reconstructions(&self) {
        let token = std::mem::take(&mut *self.cancel.lock());
        token.cancel();
        info!("Cancelling all running reconstructions");
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    fn next_job_id(&self) -> u64 {
        self.next_job.fetch_add(1, Ordering::Relaxed)
    }
}

/// One reconstruction in flight.
struct Job<'p> {
    id: u64,
    pool: &'p ThreadPool,
    cancel: CancellationToken,
}

impl Job<'_> {
    fn run(
        &self,
        source: &Volume,
        config: &ReconstructionConfig,
        progress: &dyn ReconstructionProgress,
    ) -> Result<Volume> {
        config.validate()?;
        let started = Instant::now();

        if source.order() != config.source_order {
            debug!(
                "Job {}: reading a {} stack as {}",
                self.id,
                source.order(),
                config.source_order
            );
        }

        let mapping = AxisMapping::new(config.source_order, config.destination_order);
        let source_dim = source.dim();
        let height = source_dim[mapping.source[0]];
        let radius = source_dim[mapping.source[1]];
        let angles = source_dim[mapping.source[2]];

        let dim = mapping
            .destination_dim(radius, height)
            .ok_or(ReconstructionError::DimensionOverflow)?;
        let mut output = Volume::zeros(dim, config.destination_order)?;

        // The rotation axis is at the center of the XY plane, at Z = 0.
        let origin = [
            (dim[mapping.destination[0]] / 2) as f64,
            (dim[mapping.destination[1]] / 2) as f64,
            0.0,
        ];
        let extension = Self::extension(&mapping, angles, config);
        let sampler = Sampler::with_extension(source.view(), extension);

        let chunks = ChunkPlanner::new(config.worker_count).plan(dim);
        let tasks: Vec<_> = chunks
            .iter()
            .map(|&bounds| ChunkTask {
                bounds,
                origin,
                angle_spacing: config.angle_spacing,
                mapping,
                sampler,
            })
            .collect();
        let job_progress = JobProgress::new(chunks.iter().map(ChunkBounds::voxel_count));

        info!(
            "Job {}: {:?} {} -> {:?} {} in {} chunks",
            self.id,
            source_dim,
            config.source_order,
            dim,
            config.destination_order,
            tasks.len()
        );

        self.fill(
            &mut output,
            ChunkPlanner::split_axis(dim),
            tasks,
            &job_progress,
            progress,
            config.progress_interval,
        )?;

        if self.cancel.is_cancelled() {
            warn!("Job {} was cancelled", self.id);
            return Err(ReconstructionError::Cancelled);
        }

        progress.progress_update(1.0);
        info!("Job {} finished in {:.2?}", self.id, started.elapsed());
        Ok(output)
    }

    /// Run one worker per task on the pool while a timer thread reports
    /// progress. The timer is stopped and joined before returning.
    fn fill(
        &self,
        output: &mut Volume,
        split_axis: usize,
        tasks: Vec<ChunkTask<'_>>,
        job_progress: &JobProgress,
        callback: &dyn ReconstructionProgress,
        interval: Duration,
    ) -> Result<()> {
        let mut slabs = Vec::with_capacity(tasks.len());
        let mut rest = output.data_mut();
        for task in &tasks {
            let width = task.bounds.extent(split_axis);
            let (slab, tail) = rest.split_at(ArrayAxis(split_axis), width);
            slabs.push(slab);
            rest = tail;
        }

        thread::scope(|scope| {
            let (stop_tx, stop_rx) = mpsc::channel::<()>();
            let timer = thread::Builder::new()
                .name(format!("radial-progress-{}", self.id))
                .spawn_scoped(scope, move || {
                    run_progress_timer(job_progress, callback, interval, stop_rx)
                });
            if let Err(e) = &timer {
                warn!("Job {}: progress timer not started: {e}", self.id);
            }

            let filled = panic::catch_unwind(AssertUnwindSafe(|| {
                self.pool.scope(|s| {
                    let chunks = tasks.into_iter().zip(slabs).zip(job_progress.chunks());
                    for ((task, slab), chunk_progress) in chunks {
                        let cancel = &self.cancel;
                        let id = self.id;
                        s.spawn(move |_| {
                            let outcome = ChunkWorker::new(task, chunk_progress, cancel).run(slab);
                            match outcome {
                                ChunkOutcome::Completed => {
                                    debug!("Job {id}: chunk {:?} done", task.bounds)
                                }
                                ChunkOutcome::Cancelled => {
                                    debug!("Job {id}: chunk {:?} cancelled", task.bounds)
                                }
                            }
                        });
                    }
                })
            }));

            drop(stop_tx);
            if let Ok(timer) = timer {
                if timer.join().is_err() {
                    warn!("Job {}: progress callback panicked", self.id);
                }
            }

            filled.map_err(|payload| {
                ReconstructionError::WorkerPanicked(panic_message(&*payload))
            })
        })
    }

    /// Zero outside the stack, except on the angle axis of a stack covering a
    /// full revolution (to within half a slice) when wrapping is enabled.
    fn extension(
        mapping: &AxisMapping,
        angles: usize,
        config: &ReconstructionConfig,
    ) -> [Extension; 3] {
        let mut extension = [Extension::Zero; 3];
        let coverage = angles as f64 * config.angle_spacing;
        let full_turn = coverage >= 360.0 - config.angle_spacing / 2.0;
        if config.periodic_angle && angles > 0 && full_turn {
            extension[mapping.source[2]] = Extension::Periodic;
        }
        extension
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Axis;

    fn constant_stack(value: f32) -> Volume {
        let mut stack = Volume::zeros([4, 10, 36], AxisOrder::HRTheta).unwrap();
        stack.fill(value);
        stack
    }

    fn reconstructor(workers: usize) -> Reconstructor {
        Reconstructor::new(ReconstructionConfig::default().with_worker_count(workers)).unwrap()
    }

    #[test]
    fn test_missing_input() {
        let reconstructor = reconstructor(2);
        assert!(matches!(
            reconstructor.create_reconstruction(&()),
            Err(ReconstructionError::MissingInput)
        ));
    }

    #[test]
    fn test_destination_extents() {
        let mut reconstructor = reconstructor(2);
        reconstructor.set_input_stack(constant_stack(1.0));
        reconstructor.set_angle_spacing(10.0).unwrap();

        let output = reconstructor.create_reconstruction(&()).unwrap();
        assert_eq!(output.dim(), [20, 20, 4]);
        assert_eq!(output.order(), AxisOrder::RThetaH);
        assert_eq!(output.extent(Axis::Height), 4);

        reconstructor.set_destination_order(AxisOrder::HThetaR);
        let output = reconstructor.create_reconstruction(&()).unwrap();
        assert_eq!(output.dim(), [4, 20, 20]);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut reconstructor = reconstructor(1);
        assert!(reconstructor.set_angle_spacing(0.0).is_err());
        assert_eq!(reconstructor.angle_spacing(), 1.0);
        assert!(reconstructor.set_worker_count(0).is_err());
        assert!(Reconstructor::new(ReconstructionConfig::default().with_worker_count(0)).is_err());
    }

    #[test]
    fn test_cancelled_token_fails_the_job() {
        let reconstructor = reconstructor(2);
        let job = Job {
            id: 0,
            pool: &reconstructor.pool,
            cancel: CancellationToken::new(),
        };
        job.cancel.cancel();
        let config = ReconstructionConfig::default().with_angle_spacing(10.0);
        let result = job.run(&constant_stack(1.0), &config, &());
        assert!(matches!(result, Err(ReconstructionError::Cancelled)));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_worker_panic_is_reported() {
        let reconstructor = reconstructor(2);
        let job = Job {
            id: 0,
            pool: &reconstructor.pool,
            cancel: CancellationToken::new(),
        };
        let source = constant_stack(1.0);
        let mut output = Volume::zeros([8, 8, 2], AxisOrder::RThetaH).unwrap();

        // Full width along the split axis, half along the next one.
        let bounds = ChunkBounds {
            min: [0, 0, 0],
            max: [7, 3, 1],
        };
        let task = ChunkTask {
            bounds,
            origin: [4.0, 4.0, 0.0],
            angle_spacing: 10.0,
            mapping: AxisMapping::new(AxisOrder::HRTheta, AxisOrder::RThetaH),
            sampler: Sampler::new(source.view()),
        };
        let progress = JobProgress::new([bounds.voxel_count()]);

        let result = job.fill(
            &mut output,
            0,
            vec![task],
            &progress,
            &(),
            Duration::from_millis(10),
        );
        assert!(matches!(result, Err(ReconstructionError::WorkerPanicked(_))));

        // The pool is still usable afterwards.
        let config = ReconstructionConfig::default().with_angle_spacing(10.0);
        assert!(job.run(&source, &config, &()).is_ok());
    }

    #[test]
    fn test_kill_replaces_token() {
        let reconstructor = reconstructor(1);
        let before = reconstructor.current_token();
        reconstructor.kill_all_reconstructions();
        assert!(before.is_cancelled());
        assert!(!reconstructor.current_token().is_cancelled());
    }

    #[test]
    fn test_periodic_only_for_full_turn() {
        let mapping = AxisMapping::new(AxisOrder::HRTheta, AxisOrder::RThetaH);
        let config = ReconstructionConfig::default();
        assert_eq!(Job::extension(&mapping, 360, &config)[2], Extension::Periodic);
        assert_eq!(Job::extension(&mapping, 180, &config), [Extension::Zero; 3]);

        let config = config.with_angle_spacing(2.79);
        assert_eq!(Job::extension(&mapping, 129, &config)[2], Extension::Periodic);

        let config = ReconstructionConfig::default().with_periodic_angle(false);
        assert_eq!(Job::extension(&mapping, 360, &config), [Extension::Zero; 3]);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");
    }
}
