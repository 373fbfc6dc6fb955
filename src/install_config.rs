//! Configuration Installer
//!
//! Turns the built configuration, whose paths point into the staging tree,
//! into the final configuration: engine paths are rewritten to the install
//! tree, packaging sandbox prefixes are stripped, and the data directories
//! are filled in. An existing final configuration is never overwritten.

use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Configuration;
use crate::error::Result;
use crate::paths::{rewrite_prefix, RuntimeRoot};

/// Standard system data root; anything else gets the per-user notice.
pub const STANDARD_DATA_ROOT: &str = "/usr/share";

/// Per-user configuration file name (in the home directory).
pub const USER_CONFIG_NAME: &str = ".motifpipe.toml";

/// Application directory below the data root.
pub const APP_DIR: &str = "motifpipe";

/// Where the final configuration ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConfigInstallOutcome {
    /// No configuration existed; written in place.
    Written { path: PathBuf },
    /// A configuration already existed and was left untouched.
    Candidate { existing: PathBuf, candidate: PathBuf },
}

impl ConfigInstallOutcome {
    /// The file that was actually written.
    pub fn written_path(&self) -> &Path {
        match self {
            Self::Written { path } => path,
            Self::Candidate { candidate, .. } => candidate,
        }
    }
}

/// Install-time locations for [`install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTargets<'a> {
    /// Configuration produced by the build.
    pub built_config: &'a Path,
    /// Tools prefix the built configuration refers to.
    pub staging_tools_root: &'a Path,
    /// Tools prefix after installation (possibly inside a packaging sandbox).
    pub install_tools_root: &'a Path,
    /// Data root after installation (possibly inside a packaging sandbox).
    pub data_root: &'a Path,
    /// Where the final configuration is written.
    pub final_config: &'a Path,
}

/// Sibling `<name>.new` of `path`.
pub fn candidate_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".new");
    path.with_file_name(name)
}

/// Rewrite every staged path of `config` from `from` to `to` and point the
/// data directories at `app_root`.
pub fn rewrite_configuration(
    mut config: Configuration,
    from: &Path,
    to: &Path,
    app_root: &Path,
) -> Configuration {
    for entry in config.programs.values_mut() {
        entry.bin = rewrite_prefix(&entry.bin, from, to);
        entry.dir = entry.dir.as_deref().map(|dir| rewrite_prefix(dir, from, to));
    }
    config.main.seqlogo = config
        .main
        .seqlogo
        .as_deref()
        .map(|seqlogo| rewrite_prefix(seqlogo, from, to));

    let mut main = config.main.with_data_dirs(app_root);
    main.tools_dir = Some(to.to_path_buf());
    config.main = main;
    config
}

/// Install the final configuration.
pub fn install(targets: &ConfigTargets<'_>, runtime: &dyn RuntimeRoot) -> Result<ConfigInstallOutcome> {
    info!("reading built configuration: {}", targets.built_config.display());
    let built = Configuration::load_from_file(targets.built_config)?;

    let final_tools = runtime.resolve(targets.install_tools_root);
    let final_data = runtime.resolve(targets.data_root);
    info!(
        "rewriting {} -> {}",
        targets.staging_tools_root.display(),
        final_tools.display()
    );
    let config = rewrite_configuration(
        built,
        targets.staging_tools_root,
        &final_tools,
        &final_data.join(APP_DIR),
    );

    let outcome = if targets.final_config.exists() {
        let candidate = candidate_path(targets.final_config);
        config.save_to_file(&candidate)?;
        warn!(
            "{} already exists and was left unchanged. The new configuration has been written to {}; \
             compare the two and move it into place to use the updated engine locations.",
            targets.final_config.display(),
            candidate.display()
        );
        ConfigInstallOutcome::Candidate {
            existing: targets.final_config.to_path_buf(),
            candidate,
        }
    } else {
        config.save_to_file(targets.final_config)?;
        ConfigInstallOutcome::Written {
            path: targets.final_config.to_path_buf(),
        }
    };

    info!("configuration file written: {}", outcome.written_path().display());
    if final_data != Path::new(STANDARD_DATA_ROOT) {
        log_user_config_notice(outcome.written_path());
    }
    Ok(outcome)
}

fn log_user_config_notice(written: &Path) {
    let user_config = dirs::home_dir()
        .map(|home| home.join(USER_CONFIG_NAME))
        .unwrap_or_else(|| PathBuf::from("~").join(USER_CONFIG_NAME));
    info!(
        "PLEASE NOTE: motifpipe is installed in a non-standard location. \
         Every user needs a personal configuration file at {}; {} can be copied there.",
        user_config.display(),
        written.display()
    );
}
