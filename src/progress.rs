//! Progress and completion notifications.
//!
//! Workers publish how many voxels of their chunk are done through a
//! [`ChunkProgress`]. A timer thread per job averages these counters and
//! hands the ratio to a [`ReconstructionProgress`] implementation supplied by
//! the caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use futures::channel::mpsc::UnboundedSender;

use crate::error::Result;
use crate::volume::Volume;

/// Receives progress updates between 0 and 1.
///
/// No guarantee is given on how often this is called. It runs on the
/// progress timer thread, so it should return quickly.
pub trait ReconstructionProgress: Send + Sync {
    fn progress_update(&self, progress: f64);
}

/// Progress updates plus the outcome of an asynchronous reconstruction.
pub trait ReconstructionCallback: ReconstructionProgress {
    /// Called once when the job ends: `Ok` with the reconstruction, or the
    /// error that stopped it ([`ReconstructionError::Cancelled`] for killed
    /// jobs).
    ///
    /// [`ReconstructionError::Cancelled`]: crate::error::ReconstructionError::Cancelled
    fn completed(&self, result: Result<Volume>);
}

impl ReconstructionProgress for () {
    fn progress_update(&self, _progress: f64) {}
}

impl<F> ReconstructionProgress for F
where
    F: Fn(f64) + Send + Sync,
{
    fn progress_update(&self, progress: f64) {
        self(progress)
    }
}

/// Notification sent over a channel by [`UnboundedSender`] callbacks.
#[derive(Debug)]
pub enum ReconstructionEvent {
    Progress(f64),
    Completed(Result<Volume>),
}

impl ReconstructionProgress for UnboundedSender<ReconstructionEvent> {
    fn progress_update(&self, progress: f64) {
        // A dropped receiver only means nobody is listening anymore.
        let _ = self.unbounded_send(ReconstructionEvent::Progress(progress));
    }
}

impl ReconstructionCallback for UnboundedSender<ReconstructionEvent> {
    fn completed(&self, result: Result<Volume>) {
        let _ = self.unbounded_send(ReconstructionEvent::Completed(result));
    }
}

/// Done-counter of one chunk. Written by its worker, read by the timer.
#[derive(Debug)]
pub struct ChunkProgress {
    done: AtomicUsize,
    total: usize,
}

impl ChunkProgress {
    pub fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
        }
    }

    #[inline]
    pub fn set_done(&self, done: usize) {
        self.done.store(done, Ordering::Relaxed);
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done() as f64 / self.total as f64
        }
    }
}

/// Progress of every chunk of one job.
#[derive(Debug, Default)]
pub struct JobProgress {
    chunks: Vec<ChunkProgress>,
}

impl JobProgress {
    pub fn new(totals: impl IntoIterator<Item = usize>) -> Self {
        Self {
            chunks: totals.into_iter().map(ChunkProgress::new).collect(),
        }
    }

    pub fn chunks(&self) -> &[ChunkProgress] {
        &self.chunks
    }

    /// Mean of the chunk ratios; a job without chunks is complete.
    pub fn mean(&self) -> f64 {
        if self.chunks.is_empty() {
            return 1.0;
        }
        let sum: f64 = self.chunks.iter().map(ChunkProgress::ratio).sum();
        (sum / self.chunks.len() as f64).clamp(0.0, 1.0)
    }
}

/// Reports the job's mean progress every `interval` until `stop` fires or
/// is dropped.
///
/// The first report is made right away. Values are non-decreasing and stay
/// below 1.0; reporting completion is left to the job itself.
pub(crate) fn run_progress_timer(
    progress: &JobProgress,
    callback: &dyn ReconstructionProgress,
    interval: Duration,
    stop: Receiver<()>,
) {
    let mut last = 0.0;
    loop {
        let ratio = progress.mean();
        if ratio < 1.0 && ratio >= last {
            callback.progress_update(ratio);
            last = ratio;
        }

        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
