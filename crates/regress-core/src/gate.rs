//! Pass/fail gate over a suite summary.

use serde::{Deserialize, Serialize};

use crate::summary::{SuiteSummary, SummaryBucket};

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateVerdict {
    pub passed: bool,

    /// Violations that caused failure (empty if passed).
    pub violations: Vec<String>,

    pub message: String,
}

/// Rules deciding whether a suite counts as a regression.
///
/// Unsuccessful runs and big numeric differences always fail. Small numeric
/// differences and textual differences only fail when opted in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuiteGate {
    #[serde(default)]
    pub fail_on_small: bool,
    #[serde(default)]
    pub fail_on_textual: bool,
}

impl SuiteGate {
    pub fn strict() -> Self {
        Self {
            fail_on_small: true,
            fail_on_textual: true,
        }
    }

    pub fn evaluate(&self, summary: &SuiteSummary) -> GateVerdict {
        let mut violations = Vec::new();

        push_violation(&mut violations, "build A run failed", &summary.build_a.failed);
        push_violation(&mut violations, "build B run failed", &summary.build_b.failed);
        push_violation(&mut violations, "big math diff", &summary.big_math);
        push_violation(&mut violations, "big table diff", &summary.big_table);
        if self.fail_on_small {
            push_violation(&mut violations, "small math diff", &summary.small_math);
            push_violation(&mut violations, "small table diff", &summary.small_table);
        }
        if self.fail_on_textual {
            push_violation(&mut violations, "textual diff", &summary.textual);
        }

        let passed = violations.is_empty();
        let message = if passed {
            format!("All {} case(s) passed", summary.ran.count)
        } else {
            format!("Gate failed with {} violation(s)", violations.len())
        };

        GateVerdict {
            passed,
            violations,
            message,
        }
    }
}

fn push_violation(violations: &mut Vec<String>, label: &str, bucket: &SummaryBucket) {
    violations.extend(bucket.entries.iter().map(|entry| format!("{label}: {entry}")));
}
