//! Pre-flight verification of the on-disk suite layout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{BuildConfig, InstallTool};

/// One verified location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyCheck {
    pub label: String,
    pub path: PathBuf,
    pub ok: bool,
}

impl VerifyCheck {
    fn exists(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ok = path.exists();
        Self {
            label: label.into(),
            path,
            ok,
        }
    }
}

/// Check each selected build's directory, executable, IDD and input folder,
/// then every auxiliary tool in the install directory.
///
/// Every selected build runs in every mode, so each is checked. Deselected
/// builds are skipped.
pub fn verify_suite_layout(
    build_a: Option<&BuildConfig>,
    build_b: Option<&BuildConfig>,
    install_dir: &Path,
) -> Vec<VerifyCheck> {
    let mut checks = Vec::new();

    for (name, build) in [("Base", build_a), ("Mod", build_b)] {
        let Some(build) = build.filter(|b| b.selected) else {
            continue;
        };
        checks.push(VerifyCheck::exists(format!("{name} directory exists"), build.root()));
        checks.push(VerifyCheck::exists(
            format!("{name} executable exists"),
            build.executable_path(),
        ));
        checks.push(VerifyCheck::exists(format!("{name} Energy+.idd exists"), build.idd_path()));
        checks.push(VerifyCheck::exists(
            format!("{name} input file folder exists"),
            build.input_dir(),
        ));
    }

    checks.push(VerifyCheck::exists("Install directory exists", install_dir));
    for tool in InstallTool::ALL {
        checks.push(VerifyCheck::exists(
            format!("{tool} exists"),
            tool.path_in(install_dir),
        ));
    }

    checks
}

/// Whether every check passed.
pub fn all_ok(checks: &[VerifyCheck]) -> bool {
    checks.iter().all(|c| c.ok)
}
