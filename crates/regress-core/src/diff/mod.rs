//! Per-artifact diff classification between two build runs.
//!
//! This module provides:
//! - Comparator contracts (`comparator` submodule)
//! - A token-level numeric comparator (`numeric` submodule)
//! - A line-level textual comparator (`text` submodule)
//! - [`DiffClassifier`], which locates artifacts and folds comparator output
//!   into a [`PairResult`]

pub mod comparator;
pub mod numeric;
pub mod text;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{
    ArtifactClass, ArtifactKind, CaseResult, DiffOutcome, DiffTolerances, NumericDiffCounts,
    PairResult, TextOutcome,
};

pub use comparator::{NumericComparator, TextComparator};
pub use numeric::TokenNumericComparator;
pub use text::LineTextComparator;

/// Classifies the differences between two runs of the same case.
///
/// Owns no simulator-specific parsing: it only locates artifacts in the two
/// run directories and delegates to the configured comparators.
#[derive(Clone)]
pub struct DiffClassifier {
    numeric: Arc<dyn NumericComparator>,
    text: Arc<dyn TextComparator>,
    tolerances: DiffTolerances,
}

impl DiffClassifier {
    pub fn new(
        numeric: Arc<dyn NumericComparator>,
        text: Arc<dyn TextComparator>,
        tolerances: DiffTolerances,
    ) -> Self {
        Self {
            numeric,
            text,
            tolerances,
        }
    }

    /// Classifier backed by the token-level default comparators.
    pub fn with_defaults(tolerances: DiffTolerances) -> Self {
        Self::new(
            Arc::new(TokenNumericComparator::new()),
            Arc::new(LineTextComparator::new()),
            tolerances,
        )
    }

    pub fn tolerances(&self) -> &DiffTolerances {
        &self.tolerances
    }

    /// Build the [`PairResult`] for one case.
    ///
    /// Artifacts are only compared when both results exist and succeeded;
    /// otherwise the pair carries no outcomes. Kinds missing from either run
    /// directory are omitted.
    pub fn classify(
        &self,
        case_id: &str,
        result_a: Option<CaseResult>,
        result_b: Option<CaseResult>,
    ) -> PairResult {
        let mut pair = PairResult::new(case_id, result_a, result_b);

        let (dir_a, dir_b) = match (&pair.result_a, &pair.result_b) {
            (Some(a), Some(b)) if a.success && b.success => (a.run_dir.clone(), b.run_dir.clone()),
            _ => {
                debug!(case_id = %case_id, "nothing to compare");
                return pair;
            }
        };

        for kind in ArtifactKind::ALL {
            let path_a = dir_a.join(kind.file_name());
            let path_b = dir_b.join(kind.file_name());
            if !path_a.is_file() || !path_b.is_file() {
                continue;
            }
            let outcome = self.compare_kind(case_id, kind, &path_a, &path_b);
            pair.outcomes.insert(kind, outcome);
        }

        pair
    }

    fn compare_kind(&self, case_id: &str, kind: ArtifactKind, a: &Path, b: &Path) -> DiffOutcome {
        match kind.class() {
            ArtifactClass::Numeric => {
                let tolerance = if kind.is_table() {
                    self.tolerances.table
                } else {
                    self.tolerances.series
                };
                match self.numeric.compare(kind, a, b, tolerance) {
                    Ok(counts) => DiffOutcome::from_counts(counts),
                    Err(e) => {
                        warn!(case_id = %case_id, kind = %kind, error = %e, "numeric comparator failed");
                        DiffOutcome::from_counts(NumericDiffCounts { big: 1, small: 0 })
                    }
                }
            }
            ArtifactClass::Textual => match self.text.compare(kind, a, b) {
                Ok(outcome) => DiffOutcome::textual(outcome),
                Err(e) => {
                    warn!(case_id = %case_id, kind = %kind, error = %e, "text comparator failed");
                    DiffOutcome::textual(TextOutcome::Differs)
                }
            },
        }
    }
}

impl std::fmt::Debug for DiffClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffClassifier")
            .field("tolerances", &self.tolerances)
            .finish_non_exhaustive()
    }
}
