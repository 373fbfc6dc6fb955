//! Directory layout of one run, resolved once from the command line.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::CONFIG_NAME;
use crate::error::Result;
use crate::install_config::APP_DIR;
use crate::paths::{normalize_data_root, PackagingMarker, PackagingMarkers};
use crate::staging::ArchFamily;

/// Every directory and file a stage reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub source_root: PathBuf,
    pub build_base: PathBuf,
    /// Staging tree (`tools.<os>-<arch>` under the build base by default).
    pub staging_root: PathBuf,
    /// Configuration written by build-config.
    pub built_config: PathBuf,
    /// Normalized data root of the install.
    pub data_root: PathBuf,
    pub install_tools_root: PathBuf,
    pub final_config: PathBuf,
    pub machine: String,
    pub arch: ArchFamily,
    pub markers: PackagingMarkers,
}

impl Layout {
    /// Layout with default staging directory, host machine and default markers.
    pub fn new(source_root: &Path, build_base: &Path, install_data: &Path) -> Result<Self> {
        Self::resolve(
            source_root,
            build_base,
            None,
            install_data,
            std::env::consts::ARCH,
            PackagingMarkers::default(),
        )
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let markers = cli
            .packaging_markers
            .iter()
            .fold(PackagingMarkers::default(), |markers, (name, skip)| {
                markers.with_marker(PackagingMarker::new(name.as_str(), *skip))
            });
        let machine = cli.machine.as_deref().unwrap_or(std::env::consts::ARCH);
        Self::resolve(
            &cli.source_dir,
            &cli.build_base,
            cli.build_tools_dir.as_deref(),
            &cli.install_data,
            machine,
            markers,
        )
    }

    fn resolve(
        source_root: &Path,
        build_base: &Path,
        build_tools_dir: Option<&Path>,
        install_data: &Path,
        machine: &str,
        markers: PackagingMarkers,
    ) -> Result<Self> {
        let source_root = std::path::absolute(source_root)?;
        let build_base = std::path::absolute(build_base)?;
        let staging_root = match build_tools_dir {
            Some(dir) => std::path::absolute(dir)?,
            None => default_staging_root(&build_base, machine),
        };
        let data_root = normalize_data_root(&std::path::absolute(install_data)?);
        let app_root = data_root.join(APP_DIR);

        Ok(Self {
            built_config: build_base.join("cfg").join(CONFIG_NAME),
            install_tools_root: app_root.join("tools"),
            final_config: app_root.join(CONFIG_NAME),
            source_root,
            build_base,
            staging_root,
            data_root,
            machine: machine.to_string(),
            arch: ArchFamily::from_machine(machine),
            markers,
        })
    }
}

/// `<build_base>/tools.<os>-<machine>`.
pub fn default_staging_root(build_base: &Path, machine: &str) -> PathBuf {
    build_base.join(format!("tools.{}-{}", std::env::consts::OS, machine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_layout() {
        let layout = Layout::new(Path::new("/src"), Path::new("/src/build"), Path::new("/usr"))
            .expect("Should resolve");

        assert_eq!(layout.data_root, PathBuf::from("/usr/share"));
        assert_eq!(layout.built_config, PathBuf::from("/src/build/cfg/motifpipe.toml"));
        assert_eq!(
            layout.install_tools_root,
            PathBuf::from("/usr/share/motifpipe/tools")
        );
        assert_eq!(
            layout.final_config,
            PathBuf::from("/usr/share/motifpipe/motifpipe.toml")
        );
        assert!(layout.staging_root.starts_with("/src/build"));
        assert_eq!(layout.machine, std::env::consts::ARCH);
    }

    #[test]
    fn test_layout_from_cli() {
        let cli = Cli::try_parse_from([
            "motifpipe-setup",
            "build",
            "--source-dir",
            "/work",
            "--build-base",
            "/work/out",
            "--machine",
            "i686",
            "--install-data",
            "/opt/share",
            "--packaging-marker",
            "stage:0",
        ])
        .expect("Should parse");

        let layout = Layout::from_cli(&cli).expect("Should resolve");

        assert_eq!(layout.source_root, PathBuf::from("/work"));
        assert_eq!(
            layout.staging_root,
            PathBuf::from(format!("/work/out/tools.{}-i686", std::env::consts::OS))
        );
        assert_eq!(layout.arch, ArchFamily::I386);
        assert_eq!(layout.data_root, PathBuf::from("/opt/share"));
        assert_eq!(layout.markers.markers().len(), 3);
    }

    #[test]
    fn test_explicit_build_tools_dir() {
        let cli = Cli::try_parse_from([
            "motifpipe-setup",
            "build-tools",
            "--build-tools-dir",
            "/tmp/staged",
        ])
        .expect("Should parse");
        let layout = Layout::from_cli(&cli).expect("Should resolve");
        assert_eq!(layout.staging_root, PathBuf::from("/tmp/staged"));
    }

    #[test]
    fn test_relative_paths_are_absolutized() {
        let layout = Layout::new(Path::new("."), Path::new("build"), Path::new("share"))
            .expect("Should resolve");
        assert!(layout.source_root.is_absolute());
        assert!(layout.staging_root.is_absolute());
        assert!(layout.data_root.is_absolute());
    }
}
