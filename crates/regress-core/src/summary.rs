//! Suite-wide result aggregation.
//!
//! [`summarize`] is a pure fold over the complete [`PairResult`] set. It is
//! never fed partial state, so concurrent completion order cannot cause
//! double counting.

use serde::{Deserialize, Serialize};

use crate::domain::{ArtifactKind, BuildSlot, DiffOutcome, NumericTier, PairResult, TextOutcome};

/// One summary category: a count plus the items behind it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SummaryBucket {
    pub count: usize,
    /// Item listing; `"case"` for case buckets, `"case: kind"` for artifact buckets.
    pub entries: Vec<String>,
    /// Unique case ids contributing to this bucket, in first-seen order.
    pub cases: Vec<String>,
}

impl SummaryBucket {
    fn add_case(&mut self, case_id: &str) {
        self.count += 1;
        self.entries.push(case_id.to_string());
        self.note_case(case_id);
    }

    fn add_artifact(&mut self, case_id: &str, kind: ArtifactKind) {
        self.count += 1;
        self.entries.push(format!("{}: {}", case_id, kind.label()));
        self.note_case(case_id);
    }

    fn note_case(&mut self, case_id: &str) {
        if !self.cases.iter().any(|c| c == case_id) {
            self.cases.push(case_id.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Per-build success/failure split.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BuildSummary {
    pub succeeded: SummaryBucket,
    pub failed: SummaryBucket,
}

/// Suite-wide summary derived from the full pair-result set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SuiteSummary {
    pub ran: SummaryBucket,
    pub build_a: BuildSummary,
    pub build_b: BuildSummary,
    pub files_compared: SummaryBucket,
    pub big_math: SummaryBucket,
    pub small_math: SummaryBucket,
    pub big_table: SummaryBucket,
    pub small_table: SummaryBucket,
    pub textual: SummaryBucket,
}

impl SuiteSummary {
    pub fn build(&self, slot: BuildSlot) -> &BuildSummary {
        match slot {
            BuildSlot::A => &self.build_a,
            BuildSlot::B => &self.build_b,
        }
    }

    /// Total unsuccessful (case, build) runs.
    pub fn unsuccessful(&self) -> usize {
        self.build_a.failed.count + self.build_b.failed.count
    }

    /// Total artifacts in any non-clean tier.
    pub fn total_diffs(&self) -> usize {
        self.big_math.count
            + self.small_math.count
            + self.big_table.count
            + self.small_table.count
            + self.textual.count
    }
}

/// Fold pair results into a [`SuiteSummary`]. Single pass; input untouched.
pub fn summarize(pair_results: &[PairResult]) -> SuiteSummary {
    let mut summary = SuiteSummary::default();

    for pair in pair_results {
        let case_id = pair.case_id.as_str();
        summary.ran.add_case(case_id);

        for (slot, result) in [(BuildSlot::A, &pair.result_a), (BuildSlot::B, &pair.result_b)] {
            let Some(result) = result else { continue };
            let build = match slot {
                BuildSlot::A => &mut summary.build_a,
                BuildSlot::B => &mut summary.build_b,
            };
            if result.success {
                build.succeeded.add_case(case_id);
            } else {
                build.failed.add_case(case_id);
            }
        }

        for (kind, outcome) in &pair.outcomes {
            summary.files_compared.add_artifact(case_id, *kind);
            let bucket = match outcome {
                DiffOutcome::Numeric { tier, .. } => match (tier, kind.is_table()) {
                    (NumericTier::Big, false) => Some(&mut summary.big_math),
                    (NumericTier::Small, false) => Some(&mut summary.small_math),
                    (NumericTier::Big, true) => Some(&mut summary.big_table),
                    (NumericTier::Small, true) => Some(&mut summary.small_table),
                    (NumericTier::None, _) => None,
                },
                DiffOutcome::Textual { outcome } => match outcome {
                    TextOutcome::Differs => Some(&mut summary.textual),
                    TextOutcome::Equal => None,
                },
            };
            if let Some(bucket) = bucket {
                bucket.add_artifact(case_id, *kind);
            }
        }
    }

    summary
}
