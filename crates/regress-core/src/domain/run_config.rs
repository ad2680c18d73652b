//! Suite-wide run configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{RegressError, Result};

/// Policy controlling which simulation environments a case runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Let each input file decide.
    #[default]
    None,
    DesignDayOnly,
    Annual,
    /// Design days run in reverse order, to expose ordering-dependent bugs.
    ReverseDesignDay,
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::None => "none",
            RunMode::DesignDayOnly => "design_day_only",
            RunMode::Annual => "annual",
            RunMode::ReverseDesignDay => "reverse_design_day",
        }
    }

    /// Whether the case's weather file, when it has one, is copied into the
    /// run directory.
    pub fn needs_weather(&self) -> bool {
        !matches!(self, RunMode::DesignDayOnly)
    }

    /// Whether a case without a weather file cannot run at all.
    pub fn requires_weather(&self) -> bool {
        matches!(self, RunMode::None | RunMode::Annual)
    }

    /// Directory under a build root holding this mode's per-case run
    /// directories.
    pub fn tests_dir(&self) -> &'static str {
        match self {
            RunMode::None => "Tests",
            RunMode::DesignDayOnly => "Tests-DDOnly",
            RunMode::Annual => "Tests-Annual",
            RunMode::ReverseDesignDay => "Tests-ReverseDD",
        }
    }

    /// The three independent run-mode flags: (design-day-only, reverse, annual).
    pub fn flags(&self) -> (bool, bool, bool) {
        match self {
            RunMode::None => (false, false, false),
            RunMode::DesignDayOnly => (true, false, false),
            RunMode::Annual => (false, false, true),
            RunMode::ReverseDesignDay => (true, true, false),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RunMode {
    type Err = RegressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(RunMode::None),
            "design_day_only" | "dd" => Ok(RunMode::DesignDayOnly),
            "annual" => Ok(RunMode::Annual),
            "reverse_design_day" | "reverse_dd" => Ok(RunMode::ReverseDesignDay),
            other => Err(RegressError::Config(format!("unknown run mode: {other}"))),
        }
    }
}

/// Minimum reporting frequency forced onto the simulator's outputs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportingFrequency {
    Detailed,
    Timestep,
    #[default]
    Hourly,
    Daily,
    Monthly,
    RunPeriod,
    Environment,
    Annual,
}

impl ReportingFrequency {
    /// Value handed to the simulator (upper case, as it expects).
    pub fn as_env_value(&self) -> &'static str {
        match self {
            ReportingFrequency::Detailed => "DETAILED",
            ReportingFrequency::Timestep => "TIMESTEP",
            ReportingFrequency::Hourly => "HOURLY",
            ReportingFrequency::Daily => "DAILY",
            ReportingFrequency::Monthly => "MONTHLY",
            ReportingFrequency::RunPeriod => "RUNPERIOD",
            ReportingFrequency::Environment => "ENVIRONMENT",
            ReportingFrequency::Annual => "ANNUAL",
        }
    }
}

impl FromStr for ReportingFrequency {
    type Err = RegressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().replace(['_', '-'], "").as_str() {
            "DETAILED" => Ok(ReportingFrequency::Detailed),
            "TIMESTEP" => Ok(ReportingFrequency::Timestep),
            "HOURLY" => Ok(ReportingFrequency::Hourly),
            "DAILY" => Ok(ReportingFrequency::Daily),
            "MONTHLY" => Ok(ReportingFrequency::Monthly),
            "RUNPERIOD" => Ok(ReportingFrequency::RunPeriod),
            "ENVIRONMENT" => Ok(ReportingFrequency::Environment),
            "ANNUAL" => Ok(ReportingFrequency::Annual),
            other => Err(RegressError::Config(format!(
                "unknown reporting frequency: {other}"
            ))),
        }
    }
}

/// Absolute + relative tolerance pair for numeric comparisons.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Tolerance {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            abs: 0.001,
            rel: 0.005,
        }
    }
}

/// Time-series data and tabular summaries are judged independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct DiffTolerances {
    #[serde(default)]
    pub series: Tolerance,
    #[serde(default)]
    pub table: Tolerance,
}

/// Configuration shared by every (case, build) pipeline in a suite run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    #[serde(default)]
    pub mode: RunMode,

    #[serde(default)]
    pub min_reporting_frequency: ReportingFrequency,

    /// Worker count; zero is promoted to one.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Install directory supplying the preprocessing/postprocessing tools.
    pub install_dir: PathBuf,

    /// Per-tool timeout in seconds (0 = none).
    #[serde(default)]
    pub tool_timeout_secs: u64,

    #[serde(default)]
    pub tolerances: DiffTolerances,
}

fn default_threads() -> usize {
    1
}

impl RunConfig {
    pub fn new(mode: RunMode, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            min_reporting_frequency: ReportingFrequency::default(),
            threads: 1,
            install_dir: install_dir.into(),
            tool_timeout_secs: 0,
            tolerances: DiffTolerances::default(),
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Worker count actually used by the scheduler.
    pub fn worker_count(&self) -> usize {
        if cfg!(windows) {
            return 1;
        }
        self.threads.max(1)
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }
}
