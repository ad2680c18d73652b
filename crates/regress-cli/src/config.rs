//! Suite configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regress_core::{selected_builds, validate_case_list, BuildConfig, Case, RunConfig, RunMode, SuiteGate};
use serde::{Deserialize, Serialize};

/// JSON suite description: the builds to compare, how to run them and which
/// cases to run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteConfig {
    #[serde(default)]
    pub build_a: Option<BuildConfig>,

    #[serde(default)]
    pub build_b: Option<BuildConfig>,

    pub run: RunConfig,

    #[serde(default)]
    pub cases: Vec<Case>,

    #[serde(default)]
    pub gate: SuiteGate,
}

/// Command-line or environment values that win over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub threads: Option<usize>,
    pub install_dir: Option<PathBuf>,
    pub mode: Option<RunMode>,
}

impl SuiteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("read suite config {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("parse suite config {:?}", path))
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(threads) = overrides.threads {
            self.run.threads = threads.max(1);
        }
        if let Some(dir) = &overrides.install_dir {
            self.run.install_dir = dir.clone();
        }
        if let Some(mode) = overrides.mode {
            self.run.mode = mode;
        }
    }

    /// Reject configurations the scheduler would refuse.
    pub fn validate(&self) -> Result<()> {
        selected_builds(self.build_a.as_ref(), self.build_b.as_ref())
            .context("suite config selects no build")?;
        validate_case_list(&self.cases).context("suite config case list")?;
        Ok(())
    }

    /// Split the case list into runnable cases and the ids of cases that
    /// cannot run in the configured mode (weather-driven runs need a
    /// weather file; design-day runs only use one when present).
    pub fn eligible_cases(&self) -> (Vec<Case>, Vec<String>) {
        if !self.run.mode.requires_weather() {
            return (self.cases.clone(), Vec::new());
        }
        let (eligible, skipped): (Vec<Case>, Vec<Case>) =
            self.cases.iter().cloned().partition(Case::has_weather);
        (eligible, skipped.into_iter().map(|c| c.id).collect())
    }

    pub fn builds(&self) -> Vec<&BuildConfig> {
        [self.build_a.as_ref(), self.build_b.as_ref()]
            .into_iter()
            .flatten()
            .filter(|b| b.selected)
            .collect()
    }
}
