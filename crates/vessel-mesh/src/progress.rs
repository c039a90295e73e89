//! Progress reporting for long-running stages.
//!
//! Stages such as accumulation (one step per face) and relaxation (one step
//! per iteration) report how far they have come. Reporting is one-way: it
//! never changes or interrupts a computation.
//!
//! ```
//! use vessel_mesh::progress::{CallbackProgressReporter, ProgressCallback, ProgressReporter};
//!
//! let callback: ProgressCallback = Box::new(|p| {
//!     println!("{}: {}%", p.stage, p.percent());
//! });
//! let reporter = CallbackProgressReporter::new(&callback);
//! reporter.report_progress(5, 10, "accumulate");
//! ```

use std::time::{Duration, Instant};

/// Snapshot of a stage's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Stage name, e.g. `"accumulate"`.
    pub stage: String,
    /// Steps done so far.
    pub done: u64,
    /// Step budget of the stage. For relaxation this is the iteration
    /// ceiling, so a converged run stops well short of it.
    pub total: u64,
    /// Time since the reporter was created.
    pub elapsed: Duration,
}

impl Progress {
    /// A snapshot with zero elapsed time.
    pub fn new(done: u64, total: u64, stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            done,
            total,
            elapsed: Duration::ZERO,
        }
    }

    /// Completed share in `[0, 1]`; 0 when `total` is 0.
    pub fn fraction(&self) -> f64 {
        match self.total {
            0 => 0.0,
            total => (self.done as f64 / total as f64).min(1.0),
        }
    }

    /// Completed share rounded to a whole percent.
    pub fn percent(&self) -> u32 {
        (100.0 * self.fraction()).round() as u32
    }

    /// Whether every step of a known budget is done.
    pub fn is_finished(&self) -> bool {
        self.total != 0 && self.done >= self.total
    }
}

/// Boxed progress callback.
pub type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;

/// Sink for stage progress.
pub trait ProgressReporter {
    /// Report that `done` of `total` steps of `stage` are complete.
    fn report_progress(&self, done: u64, total: u64, stage: &str);
}

/// Discards all reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    #[inline]
    fn report_progress(&self, _done: u64, _total: u64, _stage: &str) {}
}

/// Forwards reports to a [`ProgressCallback`], stamping elapsed time.
pub struct CallbackProgressReporter<'a> {
    callback: &'a ProgressCallback,
    started: Instant,
}

impl<'a> CallbackProgressReporter<'a> {
    /// Start the clock and wrap `callback`.
    pub fn new(callback: &'a ProgressCallback) -> Self {
        Self {
            callback,
            started: Instant::now(),
        }
    }
}

impl ProgressReporter for CallbackProgressReporter<'_> {
    fn report_progress(&self, done: u64, total: u64, stage: &str) {
        let progress = Progress {
            elapsed: self.started.elapsed(),
            ..Progress::new(done, total, stage)
        };
        (self.callback)(&progress);
    }
}
