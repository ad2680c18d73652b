//! Candidate builds under test and their on-disk layout.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::error::{RegressError, Result};

/// Identity of a build within one suite run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum BuildSlot {
    /// Base build.
    A,
    /// Modified build.
    B,
}

impl BuildSlot {
    pub fn name(&self) -> &'static str {
        match self {
            BuildSlot::A => "build_a",
            BuildSlot::B => "build_b",
        }
    }
}

impl fmt::Display for BuildSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One compiled instance of the simulator under test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildConfig {
    /// Build root directory.
    pub root: PathBuf,

    /// Simulator executable, relative to `root`.
    pub executable: PathBuf,

    /// Whether this build participates in the run.
    #[serde(default = "default_selected")]
    pub selected: bool,
}

fn default_selected() -> bool {
    true
}

impl BuildConfig {
    pub fn new(root: impl Into<PathBuf>, executable: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            executable: executable.into(),
            selected: true,
        }
    }

    /// Exclude this build from the run.
    pub fn deselected(mut self) -> Self {
        self.selected = false;
        self
    }

    pub fn executable_path(&self) -> PathBuf {
        self.root.join(&self.executable)
    }

    /// Shared interface-description file copied into every run directory.
    pub fn idd_path(&self) -> PathBuf {
        self.root.join("Energy+.idd")
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.join("InputFiles")
    }

    pub fn weather_dir(&self) -> PathBuf {
        self.root.join("WeatherData")
    }

    pub fn weather_path(&self, weather: &str) -> PathBuf {
        self.weather_dir().join(format!("{weather}.epw"))
    }

    /// Per-case run directory under the given tests directory name.
    pub fn run_dir(&self, tests_dir: &str, case_id: &str) -> PathBuf {
        self.root.join(tests_dir).join(case_id)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Resolve the two optional builds into the list of participating slots.
///
/// Fails when neither build is selected.
pub fn selected_builds(
    build_a: Option<&BuildConfig>,
    build_b: Option<&BuildConfig>,
) -> Result<Vec<(BuildSlot, BuildConfig)>> {
    let mut builds = Vec::new();
    if let Some(a) = build_a.filter(|b| b.selected) {
        builds.push((BuildSlot::A, a.clone()));
    }
    if let Some(b) = build_b.filter(|b| b.selected) {
        builds.push((BuildSlot::B, b.clone()));
    }
    if builds.is_empty() {
        return Err(RegressError::Config(
            "at least one build must be selected".to_string(),
        ));
    }
    Ok(builds)
}
