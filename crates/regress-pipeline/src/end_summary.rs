//! Parsing of the simulator's end-of-run marker file.

use std::sync::OnceLock;

use regex::Regex;
use regress_core::EndSummary;

/// Marker file written by the simulator when it exits.
pub const END_FILE: &str = "eplusout.end";

const SUCCESS_MARKER: &str = "EnergyPlus Completed Successfully";

fn counts_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)\s+Warning;\s*(\d+)\s+Severe Errors")
            .unwrap_or_else(|e| unreachable!("static pattern: {e}"))
    })
}

/// Parse the end file. `None` unless the run reported successful completion.
///
/// Counts default to zero when the line carries none.
pub fn parse_end_summary(text: &str) -> Option<EndSummary> {
    if !text.contains(SUCCESS_MARKER) {
        return None;
    }
    let mut summary = EndSummary::default();
    if let Some(caps) = counts_pattern().captures(text) {
        summary.warnings = caps[1].parse().unwrap_or_default();
        summary.severe_errors = caps[2].parse().unwrap_or_default();
    }
    Some(summary)
}
