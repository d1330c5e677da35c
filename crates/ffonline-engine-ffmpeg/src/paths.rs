//! Mapping of engine file names onto the private working directory.

use std::path::{Component, Path, PathBuf};

use ffonline_core::{EngineError, EngineResult};

/// Resolve `name` beneath `root`, rejecting names that would escape it.
pub(crate) fn resolve(root: &Path, name: &str) -> EngineResult<PathBuf> {
    if name.trim().is_empty() {
        return Err(invalid(name, "empty_name"));
    }
    let path = Path::new(name);
    if path.is_absolute() {
        return Err(invalid(name, "absolute_path"));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid(name, "path_traversal"));
            }
        }
    }
    Ok(root.join(path))
}

/// Resolve a directory listing path; `.`, `/`, and the empty string mean the root.
pub(crate) fn resolve_dir(root: &Path, path: &str) -> EngineResult<PathBuf> {
    match path.trim() {
        "" | "." | "/" | "./" => Ok(root.to_path_buf()),
        other => resolve(root, other.trim_start_matches('/')),
    }
}

fn invalid(name: &str, reason: &'static str) -> EngineError {
    EngineError::InvalidName {
        name: name.to_string(),
        reason,
    }
}
