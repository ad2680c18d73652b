//! Token-level numeric comparator.

use std::path::Path;

use crate::diff::comparator::NumericComparator;
use crate::domain::{ArtifactKind, NumericDiffCounts, RegressError, Result, Tolerance};

/// Splits both files into tokens and compares them position by position.
///
/// Numeric token pairs are judged against the tolerance: a difference that
/// exceeds both the absolute and the relative threshold is big, any other
/// non-zero difference is small. Mismatched non-numeric tokens and extra
/// tokens on either side count as big differences.
#[derive(Debug, Clone, Default)]
pub struct TokenNumericComparator;

impl TokenNumericComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare two in-memory documents.
    pub fn compare_str(&self, base: &str, modified: &str, tolerance: Tolerance) -> NumericDiffCounts {
        let base_tokens: Vec<&str> = tokenize(base).collect();
        let modified_tokens: Vec<&str> = tokenize(modified).collect();

        let mut counts = NumericDiffCounts::default();
        for (a, b) in base_tokens.iter().zip(modified_tokens.iter()) {
            if a == b {
                continue;
            }
            match (a.parse::<f64>(), b.parse::<f64>()) {
                (Ok(x), Ok(y)) => match classify_values(x, y, tolerance) {
                    Some(true) => counts.big += 1,
                    Some(false) => counts.small += 1,
                    None => {}
                },
                _ => counts.big += 1,
            }
        }
        counts.big += base_tokens.len().abs_diff(modified_tokens.len());
        counts
    }
}

impl NumericComparator for TokenNumericComparator {
    fn compare(
        &self,
        kind: ArtifactKind,
        base: &Path,
        modified: &Path,
        tolerance: Tolerance,
    ) -> Result<NumericDiffCounts> {
        let read = |path: &Path| {
            std::fs::read(path)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(|e| RegressError::Comparator {
                    kind: kind.label().to_string(),
                    reason: format!("read {}: {}", path.display(), e),
                })
        };
        let base_text = read(base)?;
        let modified_text = read(modified)?;
        Ok(self.compare_str(&base_text, &modified_text, tolerance))
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '<' | '>'))
        .filter(|t| !t.is_empty())
}

/// `Some(true)` = big, `Some(false)` = small, `None` = equal.
fn classify_values(x: f64, y: f64, tolerance: Tolerance) -> Option<bool> {
    let abs_diff = (x - y).abs();
    if abs_diff == 0.0 {
        return None;
    }
    if abs_diff.is_nan() {
        return Some(true);
    }
    let scale = x.abs().max(y.abs());
    let rel_diff = if scale > 0.0 { abs_diff / scale } else { 0.0 };
    Some(abs_diff > tolerance.abs && rel_diff > tolerance.rel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol() -> Tolerance {
        Tolerance {
            abs: 0.001,
            rel: 0.005,
        }
    }

    #[test]
    fn test_identical_documents_have_no_diffs() {
        let doc = "Date/Time,Zone Temp [C]\n 01/21  01:00:00,21.5\n";
        let counts = TokenNumericComparator::new().compare_str(doc, doc, tol());
        assert_eq!(counts, NumericDiffCounts::default());
    }

    #[test]
    fn test_small_diff_within_tolerance() {
        let counts = TokenNumericComparator::new().compare_str("1,100.0", "1,100.0004", tol());
        assert_eq!(counts.big, 0);
        assert_eq!(counts.small, 1);
    }

    #[test]
    fn test_big_diff_exceeds_both_thresholds() {
        let counts = TokenNumericComparator::new().compare_str("1,100.0", "1,110.0", tol());
        assert_eq!(counts.big, 1);
        assert_eq!(counts.small, 0);
    }

    #[test]
    fn test_large_abs_small_rel_is_small() {
        // 0.2 absolute on 1e6 is far below 0.5% relative.
        let counts = TokenNumericComparator::new().compare_str("1000000.0", "1000000.2", tol());
        assert_eq!(counts.big, 0);
        assert_eq!(counts.small, 1);
    }

    #[test]
    fn test_text_mismatch_and_length_mismatch_are_big() {
        let counts = TokenNumericComparator::new().compare_str("a,1,2", "b,1,2,3", tol());
        assert_eq!(counts.big, 2);
    }

    #[test]
    fn test_html_cells_are_tokenized() {
        let base = "<td>  12.50</td><td>Heating</td>";
        let modified = "<td>  12.50</td><td>Heating</td>";
        assert_eq!(
            TokenNumericComparator::new().compare_str(base, modified, tol()),
            NumericDiffCounts::default()
        );
    }

    #[test]
    fn test_compare_missing_file_is_comparator_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let present = dir.path().join("a.eso");
        std::fs::write(&present, "1").expect("write");
        let err = TokenNumericComparator::new()
            .compare(ArtifactKind::Eso, &present, &dir.path().join("missing.eso"), tol())
            .unwrap_err();
        assert!(matches!(err, RegressError::Comparator { .. }));
    }
}
