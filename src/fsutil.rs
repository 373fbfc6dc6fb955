//! Filesystem helpers shared by the staging collector and installer.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions of interpreter scripts that must be executable after a copy.
pub const INTERPRETER_SCRIPT_EXTENSIONS: &[&str] = &["pl", "sh", "py"];

/// Mode applied to interpreter scripts.
pub const SCRIPT_MODE: u32 = 0o755;

/// Recursively copy `src` into `dst`, creating directories as needed.
///
/// Symlinks are followed. Existing files in `dst` are overwritten, and `dst`
/// itself is skipped when it lies inside `src`. Returns every file written,
/// in sorted traversal order.
pub fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    copy_tree_into(src, dst, dst, &mut written)?;
    Ok(written)
}

fn copy_tree_into(
    src: &Path,
    dst: &Path,
    skip: &Path,
    written: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;

    let mut entries = fs::read_dir(src)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let from = entry.path();
        if from == skip {
            continue;
        }
        let to = dst.join(entry.file_name());
        if fs::metadata(&from)?.is_dir() {
            copy_tree_into(&from, &to, skip, written)?;
        } else {
            fs::copy(&from, &to)?;
            debug!("copied {} -> {}", from.display(), to.display());
            written.push(to);
        }
    }
    Ok(())
}

/// Replace `dst` wholesale with a copy of `src`.
///
/// Fails without touching anything if `dst` contains `src`.
pub fn replace_tree(src: &Path, dst: &Path) -> std::io::Result<Vec<PathBuf>> {
    if src.starts_with(dst) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} contains the source tree {}", dst.display(), src.display()),
        ));
    }
    if dst.exists() {
        fs::remove_dir_all(dst)?;
    }
    copy_tree(src, dst)
}

/// Copy a single file to `dst`, creating the parent directory.
pub fn copy_file(src: &Path, dst: &Path) -> std::io::Result<PathBuf> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    debug!("copied {} -> {}", src.display(), dst.display());
    Ok(dst.to_path_buf())
}

/// Whether the file name marks an interpreter script.
pub fn is_interpreter_script(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| INTERPRETER_SCRIPT_EXTENSIONS.contains(&ext))
}

/// Set the executable mode on `path`.
pub fn make_executable(path: &Path) -> std::io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(SCRIPT_MODE))
}

/// Whether `path` is a regular file with any executable bit set.
pub fn is_executable_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
