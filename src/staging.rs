//! Staging Collector
//!
//! Gathers whichever engine binaries were bundled or compiled in the source
//! tree into a single staging directory. Every rule is conditional on its
//! source existing: a missing engine is skipped, not reported as a failure.
//! Copy errors on sources that do exist are fatal.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, SetupError};
use crate::fsutil;

/// Host architecture family used to pick prebuilt binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchFamily {
    X86_64,
    I386,
}

impl ArchFamily {
    /// Anything that is not 64-bit Intel gets the 32-bit build.
    pub fn from_machine(machine: &str) -> Self {
        if machine == "x86_64" {
            Self::X86_64
        } else {
            Self::I386
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::I386 => "i386",
        }
    }
}

/// One staging instruction. Source paths are relative to the source root,
/// destinations relative to the staging root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingRule {
    /// Copy a single file.
    File {
        src: &'static str,
        dest: &'static str,
    },
    /// Copy a file if the `when` directory exists.
    FileIfDir {
        when: &'static str,
        src: &'static str,
        dest: &'static str,
    },
    /// Replace `dest` with a copy of the `src` directory.
    Tree {
        src: &'static str,
        dest: &'static str,
    },
    /// Copy every file in `dir` whose name equals one of `names` or starts
    /// with one of `prefixes`.
    Matching {
        dir: &'static str,
        names: &'static [&'static str],
        prefixes: &'static [&'static str],
    },
    /// Copy `<src_stem>_<arch>` from `dir` to `dest`.
    PerArch {
        dir: &'static str,
        src_stem: &'static str,
        dest: &'static str,
    },
}

/// Staging rules, applied in order.
pub const STAGING_RULES: &[StagingRule] = &[
    // Compiled binaries, copied flat
    StagingRule::File { src: "src/meme_4.6.0/src/meme.bin", dest: "meme.bin" },
    StagingRule::File { src: "src/MDmodule/MDmodule", dest: "MDmodule" },
    StagingRule::File { src: "src/BioProspector/BioProspector", dest: "BioProspector" },
    StagingRule::File { src: "src/GADEM_v1.3/src/gadem", dest: "gadem" },
    StagingRule::File { src: "src/posmo/posmo", dest: "posmo" },
    StagingRule::File { src: "src/AMD/AMD.bin", dest: "AMD.bin" },
    StagingRule::File { src: "src/homer/bin/homer2", dest: "homer2" },
    // Sequence logo renderer
    StagingRule::Matching {
        dir: "src/weblogo",
        names: &["seqlogo"],
        prefixes: &["logo.", "template."],
    },
    StagingRule::FileIfDir { when: "src/posmo", src: "src/posmo/clusterwd", dest: "clusterwd" },
    // Engines shipped as whole directories
    StagingRule::Tree { src: "src/ChIPMunk", dest: "ChIPMunk" },
    StagingRule::Tree { src: "src/HMS", dest: "HMS" },
    StagingRule::Tree { src: "src/trawler_standalone-1.2", dest: "trawler" },
    // Prebuilt, architecture specific
    StagingRule::PerArch { dir: "src/MotifSampler", src_stem: "MotifSampler", dest: "MotifSampler" },
    StagingRule::PerArch {
        dir: "src/MotifSampler",
        src_stem: "CreateBackgroundModel",
        dest: "CreateBackgroundModel",
    },
    StagingRule::PerArch { dir: "src/Improbizer", src_stem: "ameme", dest: "ameme" },
];

/// What the collector placed in the staging tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagingReport {
    pub staging_root: PathBuf,
    pub staged: Vec<PathBuf>,
    /// Sources that were not present in the source tree.
    pub skipped: Vec<PathBuf>,
}

/// Collect bundled engines from `source_root` into `staging_root`.
pub fn collect(source_root: &Path, staging_root: &Path, arch: ArchFamily) -> Result<StagingReport> {
    collect_with_rules(source_root, staging_root, arch, STAGING_RULES)
}

/// Collect using an explicit rule table.
pub fn collect_with_rules(
    source_root: &Path,
    staging_root: &Path,
    arch: ArchFamily,
    rules: &[StagingRule],
) -> Result<StagingReport> {
    fs::create_dir_all(staging_root).map_err(|e| {
        SetupError::staging(format!("cannot create {}: {}", staging_root.display(), e))
    })?;

    let mut report = StagingReport {
        staging_root: staging_root.to_path_buf(),
        ..StagingReport::default()
    };

    for rule in rules {
        apply_rule(rule, source_root, staging_root, arch, &mut report)?;
    }

    info!(
        "staged {} file(s) into {} ({} source(s) not present)",
        report.staged.len(),
        staging_root.display(),
        report.skipped.len()
    );
    Ok(report)
}

fn apply_rule(
    rule: &StagingRule,
    source_root: &Path,
    staging_root: &Path,
    arch: ArchFamily,
    report: &mut StagingReport,
) -> Result<()> {
    match *rule {
        StagingRule::File { src, dest } => {
            stage_file(&source_root.join(src), &staging_root.join(dest), report)
        }
        StagingRule::FileIfDir { when, src, dest } => {
            if source_root.join(when).is_dir() {
                stage_file(&source_root.join(src), &staging_root.join(dest), report)
            } else {
                report.skipped.push(source_root.join(when));
                Ok(())
            }
        }
        StagingRule::Tree { src, dest } => {
            let from = source_root.join(src);
            if !from.is_dir() {
                debug!("not bundled: {}", from.display());
                report.skipped.push(from);
                return Ok(());
            }
            info!("staging {}", dest);
            let copied = fsutil::replace_tree(&from, &staging_root.join(dest))
                .map_err(|e| copy_error(&from, e))?;
            report.staged.extend(copied);
            Ok(())
        }
        StagingRule::Matching { dir, names, prefixes } => {
            let from = source_root.join(dir);
            if !from.is_dir() {
                report.skipped.push(from);
                return Ok(());
            }
            info!("staging files from {}", from.display());
            let mut entries = fs::read_dir(&from)
                .and_then(|it| it.collect::<std::io::Result<Vec<_>>>())
                .map_err(|e| copy_error(&from, e))?;
            entries.sort_by_key(|e| e.file_name());
            for entry in entries {
                let name = entry.file_name().to_string_lossy().into_owned();
                let wanted = names.contains(&name.as_str())
                    || prefixes.iter().any(|p| name.starts_with(p));
                if wanted && entry.path().is_file() {
                    stage_file(&entry.path(), &staging_root.join(&name), report)?;
                }
            }
            Ok(())
        }
        StagingRule::PerArch { dir, src_stem, dest } => {
            let from = source_root.join(dir);
            if !from.is_dir() {
                report.skipped.push(from);
                return Ok(());
            }
            info!("copying {} ({})", dest, arch.suffix());
            let src = from.join(format!("{}_{}", src_stem, arch.suffix()));
            stage_file(&src, &staging_root.join(dest), report)
        }
    }
}

fn stage_file(src: &Path, dest: &Path, report: &mut StagingReport) -> Result<()> {
    if !src.is_file() {
        debug!("not bundled: {}", src.display());
        report.skipped.push(src.to_path_buf());
        return Ok(());
    }
    let written = fsutil::copy_file(src, dest).map_err(|e| copy_error(src, e))?;
    report.staged.push(written);
    Ok(())
}

fn copy_error(src: &Path, err: std::io::Error) -> SetupError {
    SetupError::staging(format!("failed to stage {}: {}", src.display(), err))
}
