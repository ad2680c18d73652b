//! Lifecycle tracing for suite runs.

use regress_core::obs::{
    emit_build_complete, emit_case_classified, emit_case_completed, emit_gate_evaluated,
    emit_suite_cancelled, emit_suite_finished, emit_suite_started, suite_span,
};
use regress_core::{BuildSlot, CaseResult, RunMode};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_suite_started_logs_mode_and_counts() {
    emit_suite_started("suite-1", RunMode::Annual, 12, 2, 4);
    assert!(logs_contain("suite.started"));
    assert!(logs_contain("mode=annual"));
    assert!(logs_contain("cases=12"));
}

#[traced_test]
#[test]
fn test_emit_case_completed_logs_failure_stage() {
    let result = CaseResult::failed("5ZoneAirCooled", BuildSlot::B, "/tmp/x", "reorder", "N < 2");
    emit_case_completed(&result);
    assert!(logs_contain("case.completed"));
    assert!(logs_contain("build=build_b"));
    assert!(logs_contain("stage=reorder"));
}

#[traced_test]
#[test]
fn test_emit_case_completed_logs_success() {
    emit_case_completed(&CaseResult::succeeded("1ZoneUncontrolled", BuildSlot::A, "/tmp/y", 2.5));
    assert!(logs_contain("success=true"));
}

#[traced_test]
#[test]
fn test_classification_and_build_events() {
    emit_case_classified("c1", 14, false);
    emit_build_complete(BuildSlot::A);
    assert!(logs_contain("case.classified"));
    assert!(logs_contain("build.complete"));
}

#[traced_test]
#[test]
fn test_cancel_is_warn_level() {
    emit_suite_cancelled("suite-2", 3);
    assert!(logs_contain("WARN"));
    assert!(logs_contain("suite.cancelled"));
}

#[traced_test]
#[test]
fn test_gate_and_finish_events() {
    emit_gate_evaluated("suite-3", 0, true);
    emit_suite_finished("suite-3", 1500, 10, false);
    assert!(logs_contain("gate.evaluated"));
    assert!(logs_contain("suite.finished"));
}

#[traced_test]
#[test]
fn test_suite_span_tags_events() {
    let span = suite_span("suite-span");
    span.in_scope(|| emit_build_complete(BuildSlot::B));
    assert!(logs_contain("suite_id=suite-span"));
}
