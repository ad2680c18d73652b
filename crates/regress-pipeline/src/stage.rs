//! Pipeline stage definitions and tool commands.

use std::path::{Path, PathBuf};

use regress_core::{BuildConfig, InstallTool};
use serde::{Deserialize, Serialize};

/// Stages of one case pipeline, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    Macro,
    Parametric,
    Expand,
    GroundHeatTransfer,
    EnvConfigure,
    Simulate,
    Postprocess,
    Reorder,
    Cleanup,
    Done,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Init => "init",
            PipelineStage::Macro => "macro",
            PipelineStage::Parametric => "parametric",
            PipelineStage::Expand => "expand",
            PipelineStage::GroundHeatTransfer => "ground_heat_transfer",
            PipelineStage::EnvConfigure => "env_configure",
            PipelineStage::Simulate => "simulate",
            PipelineStage::Postprocess => "postprocess",
            PipelineStage::Reorder => "reorder",
            PipelineStage::Cleanup => "cleanup",
            PipelineStage::Done => "done",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A program to launch inside a run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Name used in logs and errors.
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolCommand {
    /// An auxiliary tool from the install directory.
    pub fn install_tool(tool: InstallTool, install_dir: &Path) -> Self {
        Self {
            name: tool.name().to_string(),
            program: tool.path_in(install_dir),
            args: Vec::new(),
        }
    }

    /// The simulator executable of a build.
    pub fn simulator(build: &BuildConfig) -> Self {
        Self {
            name: "simulator".to_string(),
            program: build.executable_path(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(PipelineStage::Init < PipelineStage::Macro);
        assert!(PipelineStage::Simulate < PipelineStage::Reorder);
        assert!(PipelineStage::Cleanup < PipelineStage::Done);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::GroundHeatTransfer.name(), "ground_heat_transfer");
        assert_eq!(PipelineStage::EnvConfigure.to_string(), "env_configure");
    }

    #[test]
    fn test_simulator_command() {
        let build = BuildConfig::new("/builds/base", "bin/energyplus");
        let cmd = ToolCommand::simulator(&build);
        assert_eq!(cmd.program, PathBuf::from("/builds/base/bin/energyplus"));
        assert!(cmd.args.is_empty());

        let cmd = ToolCommand::install_tool(InstallTool::ReadVarsEso, Path::new("/opt/sim"))
            .arg("test.mvi");
        assert_eq!(cmd.name, "ReadVarsESO");
        assert_eq!(cmd.args, vec!["test.mvi"]);
    }
}
