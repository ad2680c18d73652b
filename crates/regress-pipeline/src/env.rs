//! Run-mode environment handed to the simulator process.

use regress_core::RunConfig;
use tokio::process::Command;

/// Variables set on the simulator child process. The parent environment is
/// never modified, so concurrent pipelines cannot see each other's mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEnvironment {
    vars: Vec<(&'static str, String)>,
}

impl RunEnvironment {
    pub fn for_run(config: &RunConfig) -> Self {
        let flag = |on: bool| if on { "Y" } else { "" }.to_string();
        let (dd_only, reverse, annual) = config.mode.flags();
        Self {
            vars: vec![
                ("DISPLAYADVANCEDREPORTVARIABLES", "YES".to_string()),
                ("DISPLAYALLWARNINGS", "YES".to_string()),
                ("DDONLY", flag(dd_only)),
                ("REVERSEDD", flag(reverse)),
                ("FULLANNUALRUN", flag(annual)),
                (
                    "MINREPORTFREQUENCY",
                    config.min_reporting_frequency.as_env_value().to_string(),
                ),
            ],
        }
    }

    /// An environment that adds nothing.
    pub fn empty() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn vars(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.vars.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub(crate) fn apply(&self, command: &mut Command) {
        command.envs(self.vars());
    }
}
