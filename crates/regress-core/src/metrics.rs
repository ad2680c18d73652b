//! Global atomic counters for suite runs.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] at the end of a suite to log them as one event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    pipelines_run: AtomicU64,
    pipeline_failures: AtomicU64,
    cases_classified: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            pipelines_run: AtomicU64::new(0),
            pipeline_failures: AtomicU64::new(0),
            cases_classified: AtomicU64::new(0),
        }
    }

    /// Record one finished (case, build) pipeline.
    pub fn record_pipeline(&self, success: bool) {
        self.pipelines_run.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.pipeline_failures.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "pipelines_run", "counter incremented");
    }

    pub fn inc_cases_classified(&self) {
        self.cases_classified.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cases_classified", "counter incremented");
    }

    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            pipelines_run = self.pipelines_run(),
            pipeline_failures = self.pipeline_failures(),
            cases_classified = self.cases_classified(),
        );
    }

    pub fn pipelines_run(&self) -> u64 {
        self.pipelines_run.load(Ordering::Relaxed)
    }

    pub fn pipeline_failures(&self) -> u64 {
        self.pipeline_failures.load(Ordering::Relaxed)
    }

    pub fn cases_classified(&self) -> u64 {
        self.cases_classified.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.pipelines_run.store(0, Ordering::Relaxed);
        self.pipeline_failures.store(0, Ordering::Relaxed);
        self.cases_classified.store(0, Ordering::Relaxed);
    }
}
