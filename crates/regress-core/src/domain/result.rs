//! Per-run and per-case results.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::artifact::{ArtifactKind, DiffOutcome};
use crate::domain::build::BuildSlot;

/// The pipeline stage a failure occurred in, with its message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: String,
    pub message: String,
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

/// Counts parsed from the simulator's end-of-run marker file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EndSummary {
    pub warnings: u32,
    pub severe_errors: u32,
}

/// Outcome of running one case against one build. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseResult {
    pub case_id: String,
    pub build: BuildSlot,
    /// Run directory actually produced.
    pub run_dir: PathBuf,
    pub success: bool,
    /// Wall-clock runtime; only set on success.
    pub runtime_secs: Option<f64>,
    pub failure: Option<StageFailure>,
    #[serde(default)]
    pub end_summary: Option<EndSummary>,
}

impl CaseResult {
    pub fn succeeded(
        case_id: impl Into<String>,
        build: BuildSlot,
        run_dir: impl Into<PathBuf>,
        runtime_secs: f64,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            build,
            run_dir: run_dir.into(),
            success: true,
            runtime_secs: Some(runtime_secs),
            failure: None,
            end_summary: None,
        }
    }

    pub fn failed(
        case_id: impl Into<String>,
        build: BuildSlot,
        run_dir: impl Into<PathBuf>,
        stage: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            build,
            run_dir: run_dir.into(),
            success: false,
            runtime_secs: None,
            failure: Some(StageFailure {
                stage: stage.into(),
                message: message.into(),
            }),
            end_summary: None,
        }
    }

    pub fn with_end_summary(mut self, summary: EndSummary) -> Self {
        self.end_summary = Some(summary);
        self
    }

    /// Free-text failure reason, if any.
    pub fn failure_reason(&self) -> Option<String> {
        self.failure.as_ref().map(|f| f.to_string())
    }
}

/// Comparison of one case's outputs between the two builds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairResult {
    pub case_id: String,
    pub result_a: Option<CaseResult>,
    pub result_b: Option<CaseResult>,
    /// Only kinds whose artifact exists in both compared run directories.
    pub outcomes: BTreeMap<ArtifactKind, DiffOutcome>,
}

impl PairResult {
    pub fn new(
        case_id: impl Into<String>,
        result_a: Option<CaseResult>,
        result_b: Option<CaseResult>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            result_a,
            result_b,
            outcomes: BTreeMap::new(),
        }
    }

    pub fn result(&self, build: BuildSlot) -> Option<&CaseResult> {
        match build {
            BuildSlot::A => self.result_a.as_ref(),
            BuildSlot::B => self.result_b.as_ref(),
        }
    }

    /// Whether every recorded outcome is `None` / `Equal`.
    pub fn is_clean(&self) -> bool {
        self.outcomes.values().all(DiffOutcome::is_clean)
    }
}
