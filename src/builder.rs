//! Configuration Builder
//!
//! Looks up every engine in the registry against the staging tree and the
//! executable search path, records the located ones and derives the
//! default-enabled subset.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{Configuration, DefaultParams, ProgramEntry};
use crate::error::Result;
use crate::locator::{locate, LocateResult, Origin, SearchPath};
use crate::registry::{ToolSpec, SEQLOGO};

/// Per-engine lookup outcome, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupRecord {
    pub name: String,
    pub bin: Option<PathBuf>,
    pub origin: Option<Origin>,
}

/// Result of a configuration build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub configuration: Configuration,
    pub lookups: Vec<LookupRecord>,
}

/// Default-enabled subset: `available` minus every long-running engine.
pub fn default_enabled(available: &[String], registry: &[ToolSpec]) -> Vec<String> {
    available
        .iter()
        .filter(|name| {
            !registry
                .iter()
                .any(|spec| spec.long_running && spec.name == name.as_str())
        })
        .cloned()
        .collect()
}

/// Build a configuration from the staging tree.
///
/// Never fails: engines that cannot be located are simply left out.
pub fn build(
    staging_root: &Path,
    registry: &[ToolSpec],
    search_path: &SearchPath,
    params: &DefaultParams,
) -> BuildOutcome {
    info!("locating motif programs");

    let mut configuration = Configuration::new(params.clone());
    let mut available = Vec::new();
    let mut lookups = Vec::with_capacity(registry.len());

    for spec in registry {
        match locate(spec, staging_root, search_path) {
            LocateResult::Located { bin, dir, origin } => {
                available.push(spec.name.to_string());
                lookups.push(LookupRecord {
                    name: spec.name.to_string(),
                    bin: Some(bin.clone()),
                    origin: Some(origin),
                });
                configuration
                    .programs
                    .insert(spec.name.to_string(), ProgramEntry { bin, dir });
            }
            LocateResult::Absent => lookups.push(LookupRecord {
                name: spec.name.to_string(),
                bin: None,
                origin: None,
            }),
        }
    }

    match locate(&SEQLOGO, staging_root, search_path) {
        LocateResult::Located { bin, .. } => configuration.main.seqlogo = Some(bin),
        LocateResult::Absent => warn!("couldn't find seqlogo"),
    }

    let enabled = default_enabled(&available, registry);
    for name in available.iter().filter(|name| !enabled.contains(*name)) {
        info!(
            "PLEASE NOTE: {} can take a very long time to run on large datasets. \
             Therefore it is not added to the default tools. \
             You can always enable it later by adding it to `tools` in the configuration.",
            name
        );
    }

    configuration.params = params.with_tools(available, enabled);
    BuildOutcome {
        configuration,
        lookups,
    }
}

/// Write the (temporary) configuration. Failure is fatal.
pub fn write(configuration: &Configuration, path: &Path) -> Result<()> {
    info!("writing (temporary) configuration file: {}", path.display());
    configuration.save_to_file(path)
}
