//! Binary Locator
//!
//! Resolves one engine to an absolute binary path using a two-tier search:
//! the staging tree first (bundled or compiled copies), then the executable
//! search path. Absence is an ordinary outcome, never an error.

use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::fsutil::is_executable_file;
use crate::registry::{DirRule, Invocation, ToolSpec};

/// Ordered list of directories searched for system-installed engines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            dirs: dirs.into_iter().collect(),
        }
    }

    /// The process's `$PATH`.
    pub fn from_env() -> Self {
        Self::from_os_value(std::env::var_os("PATH"))
    }

    /// Empty and relative entries are dropped.
    fn from_os_value(value: Option<OsString>) -> Self {
        match value {
            Some(path_var) => {
                Self::new(std::env::split_paths(&path_var).filter(|dir| dir.is_absolute()))
            }
            None => Self::default(),
        }
    }

    /// First absolute directory holding an executable regular file named
    /// `token`.
    pub fn find(&self, token: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .filter(|dir| dir.is_absolute())
            .map(|dir| dir.join(token))
            .find(|candidate| is_executable_file(candidate))
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

/// Which tier produced a binary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Fixed path of a database pseudo-engine.
    Fixed,
    /// Bundled or compiled copy in the staging tree.
    Staged,
    /// Found on the executable search path.
    System,
}

/// Outcome of resolving one [`ToolSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateResult {
    Located {
        bin: PathBuf,
        dir: Option<PathBuf>,
        origin: Origin,
    },
    Absent,
}

impl LocateResult {
    pub fn is_located(&self) -> bool {
        matches!(self, Self::Located { .. })
    }

    pub fn bin(&self) -> Option<&Path> {
        match self {
            Self::Located { bin, .. } => Some(bin),
            Self::Absent => None,
        }
    }
}

/// Resolve `spec` against the staging tree and then `search_path`.
pub fn locate(spec: &ToolSpec, staging_root: &Path, search_path: &SearchPath) -> LocateResult {
    let (bin, origin) = match spec.invocation {
        Invocation::Fixed(path) => (PathBuf::from(path), Origin::Fixed),
        Invocation::Command { .. } => {
            let staged = staging_root.join(spec.staging_candidate());
            if staged.exists() {
                info!("using included version of {}: {}", spec.name, staged.display());
                (staged, Origin::Staged)
            } else {
                if spec.bundled {
                    info!("could not find compiled version of {}", spec.name);
                }
                match search_path.find(spec.system_token()) {
                    Some(found) => {
                        info!("using installed version of {}: {}", spec.name, found.display());
                        (found, Origin::System)
                    }
                    None => {
                        info!("not found: {}", spec.name);
                        return LocateResult::Absent;
                    }
                }
            }
        }
    };

    let dir = working_dir(&bin, spec.dir_rule);
    LocateResult::Located { bin, dir, origin }
}

/// Derive an engine's working directory from its binary path.
pub fn working_dir(bin: &Path, rule: DirRule) -> Option<PathBuf> {
    match rule {
        DirRule::None => None,
        DirRule::Parent => bin.parent().map(Path::to_path_buf),
        DirRule::StripSuffix(suffixes) => suffixes
            .iter()
            .find_map(|suffix| strip_suffix(bin, Path::new(suffix)))
            .or_else(|| bin.parent().map(Path::to_path_buf)),
    }
}

fn strip_suffix(path: &Path, suffix: &Path) -> Option<PathBuf> {
    if !path.ends_with(suffix) {
        return None;
    }
    let mut stripped = path.to_path_buf();
    for _ in suffix.components() {
        stripped.pop();
    }
    Some(stripped)
}
