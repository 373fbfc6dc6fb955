//! Staging Installer
//!
//! Copies the staging tree to the install tree and normalizes executable
//! permissions on interpreter scripts. The bundled clustering library is
//! installed through its own build system as a separate, best-effort step.
//!
//! # Failure Policy
//!
//! A missing staging tree or a failed copy aborts the install. A failed
//! clustering-library install is logged and reported, never fatal.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, SetupError};
use crate::fsutil;
use crate::subprocess::{run_command, BuildCommand, CommandOutput};

/// Source-relative location of the bundled clustering library.
pub const CLUSTER_LIBRARY_DIR: &str = "src/Algorithm-Cluster-1.49";

/// Outcome of a best-effort subordinate install step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum SubordinateOutcome {
    Completed,
    /// Nothing to do (with reason).
    Skipped(String),
    /// The step ran and failed (non-fatal).
    Failed(String),
}

impl fmt::Display for SubordinateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
            Self::Skipped(reason) => write!(f, "Skipped: {}", reason),
            Self::Failed(err) => write!(f, "Failed: {}", err),
        }
    }
}

/// Copy `staging_root` to `install_tools_root`, replacing any previous
/// install of that subtree. Returns the installed files.
pub fn install(staging_root: &Path, install_tools_root: &Path) -> Result<Vec<PathBuf>> {
    if !staging_root.is_dir() {
        return Err(SetupError::staging(format!(
            "staging tree {} does not exist; run build-tools first",
            staging_root.display()
        )));
    }

    info!(
        "installing tools {} -> {}",
        staging_root.display(),
        install_tools_root.display()
    );
    let installed = fsutil::replace_tree(staging_root, install_tools_root).map_err(|e| {
        SetupError::staging(format!(
            "failed to copy {} to {}: {}",
            staging_root.display(),
            install_tools_root.display(),
            e
        ))
    })?;

    for file in installed.iter().filter(|f| fsutil::is_interpreter_script(f)) {
        fsutil::make_executable(file)?;
        info!("changing mode of {} to {:o}", file.display(), fsutil::SCRIPT_MODE);
    }

    info!("installed {} file(s)", installed.len());
    Ok(installed)
}

/// Run the clustering library's `make install` if its build is present.
pub fn install_cluster_library(source_root: &Path) -> SubordinateOutcome {
    install_cluster_library_with(source_root, run_command)
}

/// Same as [`install_cluster_library`] with an explicit command runner.
pub fn install_cluster_library_with<F>(source_root: &Path, runner: F) -> SubordinateOutcome
where
    F: FnOnce(&BuildCommand) -> Result<CommandOutput>,
{
    let dir = source_root.join(CLUSTER_LIBRARY_DIR);
    if !dir.join("Makefile").is_file() {
        return SubordinateOutcome::Skipped(format!("no Makefile in {}", dir.display()));
    }

    let command = BuildCommand::make_install(&dir);
    match runner(&command).and_then(|output| output.ensure_success("make install")) {
        Ok(()) => {
            info!("clustering library installed");
            SubordinateOutcome::Completed
        }
        Err(e) => {
            warn!("clustering library install failed (continuing): {}", e);
            SubordinateOutcome::Failed(e.to_string())
        }
    }
}
