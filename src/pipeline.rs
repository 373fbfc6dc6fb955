//! Pipeline driver
//!
//! Each command is an ordered list of [`PipelineStage`]s. A stage is a
//! function taking the [`BuildContext`] by value and returning the updated
//! context; the driver runs them in order and stops at the first fatal error.
//!
//! # Stage Flow
//!
//! ```text
//! BuildTools -> BuildConfig -> InstallTools -> InstallConfig
//! ```
//!
//! Stages only move forward within one run. Every stage reads the filesystem
//! state an earlier stage (possibly in an earlier run) left behind.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

use crate::builder::{self, LookupRecord};
use crate::cli::Commands;
use crate::config::DefaultParams;
use crate::error::{Result, SetupError};
use crate::install_config::{self, ConfigInstallOutcome, ConfigTargets};
use crate::install_tools::{self, SubordinateOutcome};
use crate::layout::Layout;
use crate::locator::SearchPath;
use crate::registry::{self, ToolSpec};
use crate::staging::{self, StagingReport};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum PipelineStage {
    /// Collect bundled engines into the staging tree
    BuildTools = 0,
    /// Locate engines and write the built configuration
    BuildConfig = 1,
    /// Copy the staging tree to the install tree
    InstallTools = 2,
    /// Rewrite and persist the final configuration
    InstallConfig = 3,
}

impl PipelineStage {
    pub const fn description(self) -> &'static str {
        match self {
            Self::BuildTools => "Staging engine binaries",
            Self::BuildConfig => "Building configuration",
            Self::InstallTools => "Installing engine binaries",
            Self::InstallConfig => "Installing configuration",
        }
    }

    /// Returns the next stage in the sequence, or None after the last one
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::BuildTools => Some(Self::BuildConfig),
            Self::BuildConfig => Some(Self::InstallTools),
            Self::InstallTools => Some(Self::InstallConfig),
            Self::InstallConfig => None,
        }
    }

    pub const fn all_stages() -> &'static [Self] {
        &[
            Self::BuildTools,
            Self::BuildConfig,
            Self::InstallTools,
            Self::InstallConfig,
        ]
    }

    fn run(self, ctx: BuildContext) -> Result<BuildContext> {
        match self {
            Self::BuildTools => build_tools(ctx),
            Self::BuildConfig => build_config(ctx),
            Self::InstallTools => install_tools_stage(ctx),
            Self::InstallConfig => install_config_stage(ctx),
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl Commands {
    /// Stages this command runs, in order.
    pub const fn stages(self) -> &'static [PipelineStage] {
        match self {
            Self::Build => &[PipelineStage::BuildTools, PipelineStage::BuildConfig],
            Self::BuildTools => &[PipelineStage::BuildTools],
            Self::BuildConfig => &[PipelineStage::BuildConfig],
            Self::Install => PipelineStage::all_stages(),
            Self::InstallTools => &[PipelineStage::InstallTools],
            Self::InstallConfig => &[PipelineStage::InstallConfig],
        }
    }
}

/// What a run did, stage by stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub completed: Vec<PipelineStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging: Option<StagingReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lookups: Vec<LookupRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub built_config: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub installed: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_library: Option<SubordinateOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigInstallOutcome>,
}

impl RunReport {
    /// Engines that were located, in registry order.
    pub fn located(&self) -> impl Iterator<Item = &str> {
        self.lookups
            .iter()
            .filter(|p| p.bin.is_some())
            .map(|p| p.name.as_str())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything a stage needs, threaded from stage to stage.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub layout: Layout,
    pub registry: &'static [ToolSpec],
    pub search_path: SearchPath,
    pub params: DefaultParams,
    pub report: RunReport,
}

impl BuildContext {
    /// Context over the full registry and the process's `$PATH`.
    pub fn new(layout: Layout) -> Self {
        Self::with_search_path(layout, SearchPath::from_env())
    }

    pub fn with_search_path(layout: Layout, search_path: SearchPath) -> Self {
        Self {
            layout,
            registry: registry::list(),
            search_path,
            params: DefaultParams::default(),
            report: RunReport::default(),
        }
    }

    pub fn last_completed(&self) -> Option<PipelineStage> {
        self.report.completed.last().copied()
    }

    /// Stages may not repeat or go backwards within one run.
    fn ensure_forward(&self, stage: PipelineStage) -> Result<()> {
        match self.last_completed() {
            Some(last) if stage <= last => Err(SetupError::stage(format!(
                "cannot run '{}' after '{}' (pipeline is forward-only)",
                stage, last
            ))),
            _ => Ok(()),
        }
    }

    fn complete(mut self, stage: PipelineStage) -> Result<Self> {
        self.ensure_forward(stage)?;
        self.report.completed.push(stage);
        Ok(self)
    }
}

/// Run `stages` in order, stopping at the first fatal error.
pub fn run_stages(mut ctx: BuildContext, stages: &[PipelineStage]) -> Result<BuildContext> {
    for &stage in stages {
        ctx.ensure_forward(stage)?;
        info!("==> {}", stage);
        ctx = stage.run(ctx).inspect_err(|e| error!("{} failed: {}", stage, e))?;
        ctx = ctx.complete(stage)?;
    }
    Ok(ctx)
}

/// Run every stage of `command`.
pub fn run(ctx: BuildContext, command: Commands) -> Result<BuildContext> {
    run_stages(ctx, command.stages())
}

fn build_tools(mut ctx: BuildContext) -> Result<BuildContext> {
    let report = staging::collect(
        &ctx.layout.source_root,
        &ctx.layout.staging_root,
        ctx.layout.arch,
    )?;
    ctx.report.staging = Some(report);
    Ok(ctx)
}

fn build_config(mut ctx: BuildContext) -> Result<BuildContext> {
    let outcome = builder::build(
        &ctx.layout.staging_root,
        ctx.registry,
        &ctx.search_path,
        &ctx.params,
    );
    builder::write(&outcome.configuration, &ctx.layout.built_config)?;
    ctx.params = outcome.configuration.params;
    ctx.report.lookups = outcome.lookups;
    ctx.report.built_config = Some(ctx.layout.built_config.clone());
    Ok(ctx)
}

fn install_tools_stage(mut ctx: BuildContext) -> Result<BuildContext> {
    let installed = install_tools::install(&ctx.layout.staging_root, &ctx.layout.install_tools_root)?;
    let cluster = install_tools::install_cluster_library(&ctx.layout.source_root);
    info!("clustering library: {}", cluster);
    ctx.report.installed = installed;
    ctx.report.cluster_library = Some(cluster);
    Ok(ctx)
}

fn install_config_stage(mut ctx: BuildContext) -> Result<BuildContext> {
    let layout = &ctx.layout;
    let outcome = install_config::install(
        &ConfigTargets {
            built_config: &layout.built_config,
            staging_tools_root: &layout.staging_root,
            install_tools_root: &layout.install_tools_root,
            data_root: &layout.data_root,
            final_config: &layout.final_config,
        },
        &layout.markers,
    )?;
    ctx.report.config = Some(outcome);
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn context(root: &Path) -> BuildContext {
        let layout = Layout::new(
            &root.join("src-tree"),
            &root.join("build"),
            &root.join("share"),
        )
        .expect("Should resolve");
        BuildContext::with_search_path(layout, SearchPath::default())
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(PipelineStage::BuildTools.next(), Some(PipelineStage::BuildConfig));
        assert_eq!(PipelineStage::InstallConfig.next(), None);
        let all = PipelineStage::all_stages();
        assert!(all.windows(2).all(|w| w[0].next() == Some(w[1])));
    }

    #[test]
    fn test_command_stages() {
        assert_eq!(Commands::Build.stages().len(), 2);
        assert_eq!(Commands::Install.stages(), PipelineStage::all_stages());
        assert_eq!(Commands::InstallConfig.stages(), &[PipelineStage::InstallConfig]);
    }

    #[test]
    fn test_build_records_report() {
        let root = tempfile::tempdir().expect("tempdir");
        let ctx = run(context(root.path()), Commands::Build).expect("Should build");

        assert_eq!(
            ctx.report.completed,
            vec![PipelineStage::BuildTools, PipelineStage::BuildConfig]
        );
        assert!(ctx.layout.built_config.is_file());
        // Only the fixed database pseudo-engine is located in an empty tree
        assert_eq!(ctx.report.located().collect::<Vec<_>>(), vec!["JASPAR"]);
        assert_eq!(ctx.params.available_tools, vec!["JASPAR"]);
    }

    #[test]
    fn test_stages_cannot_go_backwards() {
        let root = tempfile::tempdir().expect("tempdir");
        let err = run_stages(
            context(root.path()),
            &[PipelineStage::BuildConfig, PipelineStage::BuildTools],
        )
        .unwrap_err();
        assert!(matches!(err, SetupError::Stage(_)));
    }

    #[test]
    fn test_install_tools_without_staging_stops_pipeline() {
        let root = tempfile::tempdir().expect("tempdir");
        let ctx = context(root.path());
        let final_config = ctx.layout.final_config.clone();

        let result = run(ctx, Commands::InstallTools);

        assert!(matches!(result, Err(SetupError::Staging(_))));
        assert!(!final_config.exists());
    }

    #[test]
    fn test_install_config_without_build_fails() {
        let root = tempfile::tempdir().expect("tempdir");
        let result = run(context(root.path()), Commands::InstallConfig);
        assert!(matches!(result, Err(SetupError::ConfigRead { .. })));
    }

    #[test]
    fn test_report_json() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join("src-tree")).unwrap();
        let ctx = run(context(root.path()), Commands::BuildTools).expect("Should stage");
        let json = ctx.report.to_json().expect("Should serialize");
        assert!(json.contains("\"build-tools\""));
        assert!(json.contains("staging_root"));
        assert!(!json.contains("\"config\""));
    }
}
