//! Auxiliary programs and data files shipped in a simulator install directory.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A file the case pipeline takes from the install directory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InstallTool {
    Basement,
    Slab,
    BasementIdd,
    SlabIdd,
    ExpandObjects,
    EpMacro,
    ReadVarsEso,
    ParametricPreprocessor,
}

impl InstallTool {
    pub const ALL: [InstallTool; 8] = [
        InstallTool::Basement,
        InstallTool::Slab,
        InstallTool::BasementIdd,
        InstallTool::SlabIdd,
        InstallTool::ExpandObjects,
        InstallTool::EpMacro,
        InstallTool::ReadVarsEso,
        InstallTool::ParametricPreprocessor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InstallTool::Basement => "Basement",
            InstallTool::Slab => "Slab",
            InstallTool::BasementIdd => "BasementGHT.idd",
            InstallTool::SlabIdd => "SlabGHT.idd",
            InstallTool::ExpandObjects => "ExpandObjects",
            InstallTool::EpMacro => "EPMacro",
            InstallTool::ReadVarsEso => "ReadVarsESO",
            InstallTool::ParametricPreprocessor => "parametricpreprocessor",
        }
    }

    /// Programs get the platform executable suffix; `.idd` files do not.
    pub fn is_program(&self) -> bool {
        !matches!(self, InstallTool::BasementIdd | InstallTool::SlabIdd)
    }

    /// Location relative to the install directory.
    pub fn relative_path(&self) -> PathBuf {
        let dir: &[&str] = match self {
            InstallTool::Basement
            | InstallTool::Slab
            | InstallTool::BasementIdd
            | InstallTool::SlabIdd => &["PreProcess", "GrndTempCalc"],
            InstallTool::ExpandObjects | InstallTool::EpMacro => &[],
            InstallTool::ReadVarsEso => &["PostProcess"],
            InstallTool::ParametricPreprocessor => &["PreProcess", "ParametricPreProcessor"],
        };
        let mut path: PathBuf = dir.iter().collect();
        path.push(self.name());
        if self.is_program() && !std::env::consts::EXE_SUFFIX.is_empty() {
            path.set_extension(std::env::consts::EXE_EXTENSION);
        }
        path
    }

    pub fn path_in(&self, install_dir: &Path) -> PathBuf {
        install_dir.join(self.relative_path())
    }
}

impl fmt::Display for InstallTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
