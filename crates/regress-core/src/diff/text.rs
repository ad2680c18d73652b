//! Line-oriented textual comparator.

use std::path::Path;

use crate::diff::comparator::TextComparator;
use crate::domain::{ArtifactKind, RegressError, Result, TextOutcome};

/// Equal when both files hold the same lines, regardless of line endings.
#[derive(Debug, Clone, Default)]
pub struct LineTextComparator;

impl LineTextComparator {
    pub fn new() -> Self {
        Self
    }

    pub fn compare_str(&self, base: &str, modified: &str) -> TextOutcome {
        if base.lines().eq(modified.lines()) {
            TextOutcome::Equal
        } else {
            TextOutcome::Differs
        }
    }
}

impl TextComparator for LineTextComparator {
    fn compare(&self, kind: ArtifactKind, base: &Path, modified: &Path) -> Result<TextOutcome> {
        let read = |path: &Path| {
            std::fs::read(path)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(|e| RegressError::Comparator {
                    kind: kind.label().to_string(),
                    reason: format!("read {}: {}", path.display(), e),
                })
        };
        Ok(self.compare_str(&read(base)?, &read(modified)?))
    }
}
