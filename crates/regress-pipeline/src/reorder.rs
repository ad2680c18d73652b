//! Reverse design-day output reordering.
//!
//! A reverse design-day run simulates the design days in swapped order. To
//! make its outputs diffable against a forward run, the first two
//! per-environment row blocks of each CSV output are swapped back.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StageError, StageResult};

/// Marker counted in the input file to find the number of design days.
pub const DESIGN_DAY_MARKER: &str = "SizingPeriod:DesignDay,";

/// Time-series CSV; must exist after postprocessing.
pub const SERIES_CSV: &str = "eplusout.csv";

/// Meter CSV; optional.
pub const METER_CSV: &str = "eplusmtr.csv";

/// Count design-day objects in an input file.
pub fn count_design_days(input: &str) -> usize {
    input
        .lines()
        .filter(|line| line.contains(DESIGN_DAY_MARKER))
        .count()
}

/// Reorder `header, B1, B2, B3..Bn` into `header, B2, B1, B3..Bn`, where the
/// data rows split into `n` equal blocks.
///
/// The result is always a permutation of the input. Fails when `n < 2`, when
/// the header is missing, or when the data rows do not divide evenly.
pub fn reorder_design_day_blocks<T: Clone>(lines: &[T], n: usize) -> StageResult<Vec<T>> {
    if n < 2 {
        return Err(StageError::MalformedOutput(format!(
            "reverse design-day run needs at least 2 design days, found {n}"
        )));
    }
    let Some((header, data)) = lines.split_first() else {
        return Err(StageError::MalformedOutput(
            "output has no header row".to_string(),
        ));
    };
    if data.len() % n != 0 {
        return Err(StageError::MalformedOutput(format!(
            "{} data rows do not split evenly into {n} design days",
            data.len()
        )));
    }

    let per_env = data.len() / n;
    let mut out = Vec::with_capacity(lines.len());
    out.push(header.clone());
    out.extend_from_slice(&data[per_env..2 * per_env]);
    out.extend_from_slice(&data[..per_env]);
    out.extend_from_slice(&data[2 * per_env..]);
    Ok(out)
}

/// `eplusout.csv` -> `eplusout-before_revDD_swapback.csv`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-before_revDD_swapback.{}", ext.to_string_lossy()),
        None => format!("{stem}-before_revDD_swapback"),
    };
    path.with_file_name(name)
}

/// Back up `path` and rewrite it with its first two design-day blocks swapped.
pub async fn reorder_output_file(path: &Path, design_days: usize) -> StageResult<()> {
    let raw = tokio::fs::read(path).await.map_err(StageError::io(path))?;
    let text = String::from_utf8_lossy(&raw);

    let lines: Vec<String> = text
        .split_inclusive('\n')
        .map(|line| {
            if line.ends_with('\n') {
                line.to_string()
            } else {
                format!("{line}\n")
            }
        })
        .collect();
    let reordered = reorder_design_day_blocks(&lines, design_days)?;

    let backup = backup_path(path);
    tokio::fs::copy(path, &backup)
        .await
        .map_err(StageError::io(&backup))?;
    tokio::fs::write(path, reordered.concat())
        .await
        .map_err(StageError::io(path))?;
    debug!(file = %path.display(), rows = lines.len(), design_days, "design-day blocks swapped back");
    Ok(())
}

/// Swap back the design-day blocks of every CSV output in `run_dir`.
pub async fn reorder_run_outputs(run_dir: &Path) -> StageResult<()> {
    let input_path = run_dir.join("in.idf");
    let input = tokio::fs::read(&input_path)
        .await
        .map_err(StageError::io(&input_path))?;
    let design_days = count_design_days(&String::from_utf8_lossy(&input));

    let series = run_dir.join(SERIES_CSV);
    if !series.is_file() {
        return Err(StageError::MissingOutput(series));
    }
    reorder_output_file(&series, design_days).await?;

    let meter = run_dir.join(METER_CSV);
    if meter.is_file() {
        reorder_output_file(&meter, design_days).await?;
    }
    Ok(())
}
