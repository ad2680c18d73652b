//! Output artifact kinds and their diff outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether an artifact kind supports magnitude classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactClass {
    Numeric,
    Textual,
}

/// Output kinds produced by a simulation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Eso,
    Mtr,
    Zsz,
    Ssz,
    Table,
    Audit,
    Bnd,
    Dxf,
    Eio,
    Mdd,
    Mtd,
    Rdd,
    Shd,
    Err,
    #[serde(rename = "delightin")]
    DelightIn,
    #[serde(rename = "delightout")]
    DelightOut,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 16] = [
        ArtifactKind::Eso,
        ArtifactKind::Mtr,
        ArtifactKind::Zsz,
        ArtifactKind::Ssz,
        ArtifactKind::Table,
        ArtifactKind::Audit,
        ArtifactKind::Bnd,
        ArtifactKind::Dxf,
        ArtifactKind::Eio,
        ArtifactKind::Mdd,
        ArtifactKind::Mtd,
        ArtifactKind::Rdd,
        ArtifactKind::Shd,
        ArtifactKind::Err,
        ArtifactKind::DelightIn,
        ArtifactKind::DelightOut,
    ];

    /// File name the simulator writes for this kind inside a run directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Eso => "eplusout.eso",
            ArtifactKind::Mtr => "eplusout.mtr",
            ArtifactKind::Zsz => "epluszsz.csv",
            ArtifactKind::Ssz => "eplusssz.csv",
            ArtifactKind::Table => "eplustbl.htm",
            ArtifactKind::Audit => "eplusout.audit",
            ArtifactKind::Bnd => "eplusout.bnd",
            ArtifactKind::Dxf => "eplusout.dxf",
            ArtifactKind::Eio => "eplusout.eio",
            ArtifactKind::Mdd => "eplusout.mdd",
            ArtifactKind::Mtd => "eplusout.mtd",
            ArtifactKind::Rdd => "eplusout.rdd",
            ArtifactKind::Shd => "eplusout.shd",
            ArtifactKind::Err => "eplusout.err",
            ArtifactKind::DelightIn => "eplusout.delightin",
            ArtifactKind::DelightOut => "eplusout.delightout",
        }
    }

    /// Short label used in summaries ("case: label").
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Eso => "eso",
            ArtifactKind::Mtr => "mtr",
            ArtifactKind::Zsz => "zsz",
            ArtifactKind::Ssz => "ssz",
            ArtifactKind::Table => "table",
            ArtifactKind::Audit => "audit",
            ArtifactKind::Bnd => "bnd",
            ArtifactKind::Dxf => "dxf",
            ArtifactKind::Eio => "eio",
            ArtifactKind::Mdd => "mdd",
            ArtifactKind::Mtd => "mtd",
            ArtifactKind::Rdd => "rdd",
            ArtifactKind::Shd => "shd",
            ArtifactKind::Err => "err",
            ArtifactKind::DelightIn => "delightin",
            ArtifactKind::DelightOut => "delightout",
        }
    }

    pub fn class(&self) -> ArtifactClass {
        match self {
            ArtifactKind::Eso
            | ArtifactKind::Mtr
            | ArtifactKind::Zsz
            | ArtifactKind::Ssz
            | ArtifactKind::Table => ArtifactClass::Numeric,
            _ => ArtifactClass::Textual,
        }
    }

    /// Tabular summaries use their own tolerance policy and summary buckets.
    pub fn is_table(&self) -> bool {
        matches!(self, ArtifactKind::Table)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity tier of a numeric artifact diff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NumericTier {
    None,
    Small,
    Big,
}

/// Outcome of a textual artifact diff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextOutcome {
    Equal,
    Differs,
}

/// Counts reported by a numeric comparator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NumericDiffCounts {
    pub big: usize,
    pub small: usize,
}

impl NumericDiffCounts {
    /// Highest triggered tier; big wins over small.
    pub fn tier(&self) -> NumericTier {
        if self.big > 0 {
            NumericTier::Big
        } else if self.small > 0 {
            NumericTier::Small
        } else {
            NumericTier::None
        }
    }
}

/// Classification of one artifact kind for one case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum DiffOutcome {
    Numeric {
        tier: NumericTier,
        big_count: usize,
        small_count: usize,
    },
    Textual {
        outcome: TextOutcome,
    },
}

impl DiffOutcome {
    pub fn from_counts(counts: NumericDiffCounts) -> Self {
        DiffOutcome::Numeric {
            tier: counts.tier(),
            big_count: counts.big,
            small_count: counts.small,
        }
    }

    pub fn textual(outcome: TextOutcome) -> Self {
        DiffOutcome::Textual { outcome }
    }

    /// True for `None` / `Equal`.
    pub fn is_clean(&self) -> bool {
        match self {
            DiffOutcome::Numeric { tier, .. } => *tier == NumericTier::None,
            DiffOutcome::Textual { outcome } => *outcome == TextOutcome::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_kind_matches_label() {
        for kind in ArtifactKind::ALL {
            assert_eq!(
                serde_json::to_value(kind).expect("serialize"),
                serde_json::json!(kind.label()),
                "{kind:?}"
            );
        }
        let parsed: ArtifactKind = serde_json::from_str(r#""delightout""#).expect("parse");
        assert_eq!(parsed, ArtifactKind::DelightOut);
    }

    #[test]
    fn test_artifact_classes() {
        let numeric: Vec<_> = ArtifactKind::ALL
            .iter()
            .filter(|k| k.class() == ArtifactClass::Numeric)
            .collect();
        assert_eq!(numeric.len(), 5);
        assert_eq!(ArtifactKind::Err.class(), ArtifactClass::Textual);
        assert!(ArtifactKind::Table.is_table());
        assert!(!ArtifactKind::Eso.is_table());
    }

    #[test]
    fn test_file_names_unique() {
        let names: std::collections::HashSet<_> =
            ArtifactKind::ALL.iter().map(|k| k.file_name()).collect();
        assert_eq!(names.len(), ArtifactKind::ALL.len());
    }

    #[test]
    fn test_tier_prefers_big() {
        assert_eq!(NumericDiffCounts { big: 2, small: 7 }.tier(), NumericTier::Big);
        assert_eq!(NumericDiffCounts { big: 0, small: 1 }.tier(), NumericTier::Small);
        assert_eq!(NumericDiffCounts::default().tier(), NumericTier::None);
    }

    #[test]
    fn test_outcome_is_clean() {
        assert!(DiffOutcome::from_counts(NumericDiffCounts::default()).is_clean());
        assert!(!DiffOutcome::from_counts(NumericDiffCounts { big: 0, small: 3 }).is_clean());
        assert!(DiffOutcome::textual(TextOutcome::Equal).is_clean());
        assert!(!DiffOutcome::textual(TextOutcome::Differs).is_clean());
    }
}
