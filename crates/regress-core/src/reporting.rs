use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{BuildConfig, PairResult, RunMode};
use crate::gate::GateVerdict;
use crate::summary::{SuiteSummary, SummaryBucket};

pub const REPORT_SCHEMA_VERSION: &str = "1";

/// Persisted suite report: the summary plus enough context to tell runs apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub suite_id: String,
    pub suite_fingerprint: String,
    pub mode: RunMode,
    pub cancelled: bool,
    pub duration_ms: u64,
    pub summary: SuiteSummary,
    pub verdict: GateVerdict,
    pub pair_results: Vec<PairResult>,
}

/// SHA-256 over ordered case ids, run mode and build roots.
///
/// Two suites share a fingerprint exactly when they ran the same cases in the
/// same mode against the same build directories.
pub fn suite_fingerprint<'a>(
    case_ids: impl IntoIterator<Item = &'a str>,
    mode: RunMode,
    builds: &[&BuildConfig],
) -> String {
    let mut hasher = Sha256::new();
    for id in case_ids {
        hasher.update(id.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(mode.name().as_bytes());
    hasher.update([0u8]);
    for build in builds {
        hasher.update(build.root().to_string_lossy().as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Write the report as pretty JSON.
pub fn write_summary_json(path: &Path, report: &SuiteReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize suite report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Load a previously written JSON report.
pub fn read_summary_json(path: &Path) -> Result<SuiteReport> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parse {:?}", path))
}

/// Render a markdown summary for CI logs or PR comments.
pub fn render_summary_md(report: &SuiteReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();
    out.push_str("# Regression Summary\n\n");
    out.push_str(&format!(
        "- suite: `{}`\n- mode: {}\n- fingerprint: `{}`\n- generated: {}\n",
        report.suite_id,
        report.mode,
        report.suite_fingerprint,
        report.generated_at.to_rfc3339()
    ));
    if report.cancelled {
        out.push_str("- **cancelled before completion**\n");
    }
    out.push('\n');

    out.push_str("## Runs\n");
    out.push_str(&format!(
        "- cases ran: {}\n- build A: {} succeeded, {} failed\n- build B: {} succeeded, {} failed\n- files compared: {}\n\n",
        summary.ran.count,
        summary.build_a.succeeded.count,
        summary.build_a.failed.count,
        summary.build_b.succeeded.count,
        summary.build_b.failed.count,
        summary.files_compared.count,
    ));

    out.push_str("## Diffs\n");
    out.push_str("| Category | Count |\n|---|---|\n");
    for (label, bucket) in diff_buckets(summary) {
        out.push_str(&format!("| {} | {} |\n", label, bucket.count));
    }
    out.push('\n');

    let failed: Vec<&String> = summary
        .build_a
        .failed
        .entries
        .iter()
        .chain(summary.build_b.failed.entries.iter())
        .collect();
    if !failed.is_empty() {
        out.push_str("### Unsuccessful Runs\n");
        for case in failed {
            out.push_str(&format!("- `{}`\n", case));
        }
        out.push('\n');
    }

    for (label, bucket) in diff_buckets(summary) {
        if bucket.is_empty() {
            continue;
        }
        out.push_str(&format!("### {}\n", label));
        for entry in &bucket.entries {
            out.push_str(&format!("- `{}`\n", entry));
        }
        out.push('\n');
    }

    out.push_str("## Gate\n");
    out.push_str(&format!(
        "- verdict: {}\n- {}\n",
        if report.verdict.passed { "PASS" } else { "FAIL" },
        report.verdict.message
    ));
    out
}

/// Write the markdown summary.
pub fn write_summary_md(path: &Path, report: &SuiteReport) -> Result<()> {
    std::fs::write(path, render_summary_md(report)).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

fn diff_buckets(summary: &SuiteSummary) -> [(&'static str, &SummaryBucket); 5] {
    [
        ("Big math diffs", &summary.big_math),
        ("Small math diffs", &summary.small_math),
        ("Big table diffs", &summary.big_table),
        ("Small table diffs", &summary.small_table),
        ("Textual diffs", &summary.textual),
    ]
}
