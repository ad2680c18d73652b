//! Comparator contracts for artifact diffing.
//!
//! Format-specific parsers live behind these traits so they can be swapped
//! without touching the classifier. Implementations must report zero
//! differences for byte-identical inputs.

use std::path::Path;

use crate::domain::{ArtifactKind, NumericDiffCounts, Result, TextOutcome, Tolerance};

/// Compares two numeric artifacts and counts big/small differences.
pub trait NumericComparator: Send + Sync {
    fn compare(
        &self,
        kind: ArtifactKind,
        base: &Path,
        modified: &Path,
        tolerance: Tolerance,
    ) -> Result<NumericDiffCounts>;
}

/// Compares two textual artifacts for equality.
pub trait TextComparator: Send + Sync {
    fn compare(&self, kind: ArtifactKind, base: &Path, modified: &Path) -> Result<TextOutcome>;
}
