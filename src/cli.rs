use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// motifpipe setup - stage, discover and install motif-finding engines
#[derive(Parser, Debug)]
#[command(name = "motifpipe-setup")]
#[command(about = "Stages, configures and installs the motif-finding engines used by motifpipe")]
#[command(version)]
pub struct Cli {
    /// Root of the source tree holding bundled engines
    #[arg(long, global = true, env = "MOTIFPIPE_SOURCE_DIR", default_value = ".")]
    pub source_dir: PathBuf,

    /// Build directory for staged tools and the built configuration
    #[arg(long, global = true, env = "MOTIFPIPE_BUILD_BASE", default_value = "build")]
    pub build_base: PathBuf,

    /// Staging directory (default: <build-base>/tools.<os>-<arch>)
    #[arg(long, global = true, env = "MOTIFPIPE_BUILD_TOOLS_DIR")]
    pub build_tools_dir: Option<PathBuf>,

    /// Data directory the application is installed under
    #[arg(
        long,
        global = true,
        env = "MOTIFPIPE_INSTALL_DATA",
        default_value = "/usr/local/share"
    )]
    pub install_data: PathBuf,

    /// Machine architecture used to select prebuilt binaries (default: host)
    #[arg(long, global = true, env = "MOTIFPIPE_MACHINE")]
    pub machine: Option<String>,

    /// Extra packaging-sandbox marker, as NAME or NAME:SKIP (repeatable).
    ///
    /// The marker directory, the SKIP components after it (default 1) and
    /// everything before it are stripped from install paths, in addition to
    /// the built-in BUILDROOT and debian markers.
    #[arg(long = "packaging-marker", global = true, value_name = "NAME[:SKIP]", value_parser = parse_marker)]
    pub packaging_markers: Vec<(String, usize)>,

    /// Print a JSON run report on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Stage bundled engines and build the configuration
    Build,
    /// Collect bundled engines into the staging directory
    BuildTools,
    /// Locate engines and write the (temporary) configuration
    BuildConfig,
    /// Build, then install tools and configuration
    Install,
    /// Copy the staging directory to the install location
    InstallTools,
    /// Rewrite and write the final configuration
    InstallConfig,
}

/// Parse `NAME` or `NAME:SKIP`.
fn parse_marker(value: &str) -> Result<(String, usize), String> {
    let (name, skip) = match value.split_once(':') {
        Some((name, skip)) => {
            let skip = skip
                .parse::<usize>()
                .map_err(|e| format!("invalid skip count '{}': {}", skip, e))?;
            (name, skip)
        }
        None => (value, 1),
    };
    if name.is_empty() || name.contains('/') {
        return Err(format!("invalid marker name '{}'", name));
    }
    Ok((name.to_string(), skip))
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
