//! Path rewriting and final-runtime-root resolution.
//!
//! During packaging the install tree usually lives inside a sandbox
//! (`.../BUILDROOT/<nvr>/usr/share`, `.../debian/<pkg>/usr/share`). The
//! configuration must point at the location the software will run from, so
//! the sandbox prefix is stripped by a [`RuntimeRoot`] strategy before paths
//! are persisted.

use std::path::{Component, Path, PathBuf};

/// Substitute the `from` prefix of `path` with `to`.
///
/// The match is component-wise and the more specific prefix wins. Paths that
/// do not start with `from` are returned unchanged. When `to` is nested
/// inside `from`, paths already under `to` count as rewritten and are left
/// alone, so a second rewrite is a no-op.
pub fn rewrite_prefix(path: &Path, from: &Path, to: &Path) -> PathBuf {
    if from == to || (to.starts_with(from) && path.starts_with(to)) {
        return path.to_path_buf();
    }
    match path.strip_prefix(from) {
        Ok(rest) if rest.as_os_str().is_empty() => to.to_path_buf(),
        Ok(rest) => to.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Strategy mapping a nominal install path to the path used at runtime.
pub trait RuntimeRoot {
    fn resolve(&self, path: &Path) -> PathBuf;
}

/// Leaves every path untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl RuntimeRoot for Identity {
    fn resolve(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// A packaging-sandbox marker: the directory named `name` and the `skip`
/// components following it are removed along with everything before them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingMarker {
    pub name: String,
    pub skip: usize,
}

impl PackagingMarker {
    pub fn new(name: impl Into<String>, skip: usize) -> Self {
        Self {
            name: name.into(),
            skip,
        }
    }

    /// Strip this marker once. Returns `None` if the marker is not present.
    fn strip(&self, path: &Path) -> Option<PathBuf> {
        let components: Vec<Component<'_>> = path.components().collect();
        let index = components
            .iter()
            .position(|c| matches!(c, Component::Normal(n) if *n == self.name.as_str()))?;
        let mut stripped = PathBuf::from("/");
        for component in components.iter().skip(index + 1 + self.skip) {
            stripped.push(component.as_os_str());
        }
        Some(stripped)
    }
}

/// Strips known packaging markers until none is left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingMarkers {
    markers: Vec<PackagingMarker>,
}

impl Default for PackagingMarkers {
    /// RPM (`BUILDROOT/<nvr>`) and Debian (`debian/<pkg>`) conventions.
    fn default() -> Self {
        Self {
            markers: vec![
                PackagingMarker::new("BUILDROOT", 1),
                PackagingMarker::new("debian", 1),
            ],
        }
    }
}

impl PackagingMarkers {
    /// No markers at all; equivalent to [`Identity`].
    pub fn empty() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    pub fn with_marker(mut self, marker: PackagingMarker) -> Self {
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    pub fn markers(&self) -> &[PackagingMarker] {
        &self.markers
    }
}

impl RuntimeRoot for PackagingMarkers {
    fn resolve(&self, path: &Path) -> PathBuf {
        let mut current = path.to_path_buf();
        // Each strip removes at least one component, so this terminates.
        while let Some(stripped) = self.markers.iter().find_map(|m| m.strip(&current)) {
            current = stripped;
        }
        current
    }
}

/// Normalize the nominal data directory of an install.
///
/// A bare `/usr` becomes `/usr/share`, and a Debian staging directory ending
/// in `debian/<pkg>/usr` also gets `share` appended.
pub fn normalize_data_root(install_data: &Path) -> PathBuf {
    if install_data == Path::new("/usr") {
        return install_data.join("share");
    }
    let names: Vec<&std::ffi::OsStr> = install_data
        .components()
        .filter_map(|c| match c {
            Component::Normal(n) => Some(n),
            _ => None,
        })
        .collect();
    if names.len() >= 3 && names[names.len() - 1] == "usr" && names[names.len() - 3] == "debian" {
        return install_data.join("share");
    }
    install_data.to_path_buf()
}
