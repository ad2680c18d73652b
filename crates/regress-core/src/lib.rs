//! Regression suite core library
//!
//! Domain model, suite scheduling, artifact diff classification and result
//! aggregation for comparing two simulator builds.

pub mod diff;
pub mod domain;
pub mod events;
pub mod gate;
pub mod metrics;
pub mod obs;
pub mod reporting;
pub mod scheduler;
pub mod summary;
pub mod telemetry;
pub mod validation;

pub use domain::{
    selected_builds, validate_case_list, ArtifactClass, ArtifactKind, BuildConfig, BuildSlot,
    Case, CaseResult, DiffOutcome, DiffTolerances, EndSummary, InstallTool, NumericDiffCounts,
    NumericTier, PairResult, RegressError, ReportingFrequency, Result, RunConfig, RunMode,
    StageFailure, TextOutcome, Tolerance,
};

pub use diff::{
    DiffClassifier, LineTextComparator, NumericComparator, TextComparator, TokenNumericComparator,
};

pub use events::{EventSink, Progress, SuiteEvent};

pub use gate::{GateVerdict, SuiteGate};

pub use scheduler::{
    CancelFlag, CaseExecutor, CaseJob, SuiteHandle, SuiteOutcome, SuitePlan, SuiteRequest,
    SuiteScheduler,
};

pub use summary::{summarize, BuildSummary, SuiteSummary, SummaryBucket};

pub use validation::{verify_suite_layout, VerifyCheck};
