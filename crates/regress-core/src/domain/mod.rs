//! Domain model for regression suite runs.

pub mod artifact;
pub mod build;
pub mod case;
pub mod error;
pub mod result;
pub mod run_config;
pub mod tool;

pub use artifact::{
    ArtifactClass, ArtifactKind, DiffOutcome, NumericDiffCounts, NumericTier, TextOutcome,
};
pub use build::{selected_builds, BuildConfig, BuildSlot};
pub use case::{validate_case_list, Case};
pub use error::{RegressError, Result};
pub use result::{CaseResult, EndSummary, PairResult, StageFailure};
pub use run_config::{DiffTolerances, ReportingFrequency, RunConfig, RunMode, Tolerance};
pub use tool::InstallTool;
