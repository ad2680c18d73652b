//! Structured observability hooks for suite lifecycle events.
//!
//! This module provides:
//! - The suite-scoped tracing span every scheduler task runs inside
//! - Emission functions for key lifecycle events: suite start, case completion,
//!   classification, cancellation, gate evaluation and suite finish
//!
//! Events are emitted at `info!` level (configurable via `RUST_LOG`).

use tracing::info;

use crate::domain::{BuildSlot, CaseResult, RunMode};

/// Span covering one suite run; every event inside carries its `suite_id`.
///
/// ```ignore
/// scheduler_future.instrument(obs::suite_span("suite-1234")).await
/// ```
pub fn suite_span(suite_id: &str) -> tracing::Span {
    tracing::info_span!("regress.suite", suite_id = %suite_id)
}

/// Emit event: suite started.
pub fn emit_suite_started(suite_id: &str, mode: RunMode, cases: usize, builds: usize, workers: usize) {
    info!(
        event = "suite.started",
        suite_id = %suite_id,
        mode = %mode,
        cases = cases,
        builds = builds,
        workers = workers,
    );
}

/// Emit event: one (case, build) pipeline finished.
pub fn emit_case_completed(result: &CaseResult) {
    match &result.failure {
        None => info!(
            event = "case.completed",
            case_id = %result.case_id,
            build = %result.build,
            success = true,
            runtime_secs = result.runtime_secs.unwrap_or_default(),
        ),
        Some(failure) => info!(
            event = "case.completed",
            case_id = %result.case_id,
            build = %result.build,
            success = false,
            stage = %failure.stage,
            reason = %failure.message,
        ),
    }
}

/// Emit event: a case's two results were classified.
pub fn emit_case_classified(case_id: &str, compared: usize, clean: bool) {
    info!(event = "case.classified", case_id = %case_id, compared = compared, clean = clean);
}

/// Emit event: all simulations for one build slot are done.
pub fn emit_build_complete(build: BuildSlot) {
    info!(event = "build.complete", build = %build);
}

/// Emit event: cancellation observed, with how many results were kept.
pub fn emit_suite_cancelled(suite_id: &str, completed: usize) {
    tracing::warn!(event = "suite.cancelled", suite_id = %suite_id, completed = completed);
}

/// Emit event: gate evaluation completed.
pub fn emit_gate_evaluated(suite_id: &str, violations: usize, passed: bool) {
    info!(
        event = "gate.evaluated",
        suite_id = %suite_id,
        violations = violations,
        passed = passed,
    );
}

/// Emit event: suite finished.
pub fn emit_suite_finished(suite_id: &str, duration_ms: u64, pairs: usize, cancelled: bool) {
    info!(
        event = "suite.finished",
        suite_id = %suite_id,
        duration_ms = duration_ms,
        pairs = pairs,
        cancelled = cancelled,
    );
}
