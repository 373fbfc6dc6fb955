//! motifpipe setup library
//!
//! Provisioning pipeline for the motif-finding engines used by motifpipe:
//! stage bundled binaries, locate every engine, write a configuration and
//! install both into their final location.

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod install_config;
pub mod install_tools;
pub mod layout;
pub mod locator;
pub mod paths;
pub mod pipeline;
pub mod registry;
pub mod staging;
pub mod subprocess;

// Re-export main types for convenience
pub use builder::{build, default_enabled, BuildOutcome, LookupRecord};
pub use config::{Analysis, Configuration, DefaultParams, MainSection, ProgramEntry};
pub use error::{Result, SetupError};
pub use install_config::{ConfigInstallOutcome, ConfigTargets};
pub use install_tools::SubordinateOutcome;
pub use layout::Layout;
pub use locator::{locate, LocateResult, Origin, SearchPath};
pub use paths::{rewrite_prefix, Identity, PackagingMarker, PackagingMarkers, RuntimeRoot};
pub use pipeline::{BuildContext, PipelineStage, RunReport};
pub use registry::{DirRule, Engine, Invocation, ToolSpec, REGISTRY};
pub use staging::{ArchFamily, StagingReport};
pub use subprocess::CommandProcessGroup;
