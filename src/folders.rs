//! Locating the project's figures folder.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{AutoInkError, Result};

/// Search `start` and up to `depth - 1` of its parents for a directory named
/// after one of `candidates`.
///
/// Candidates are tried in order at each level, so an earlier name wins over
/// a later one living in the same parent. A depth of 1 only looks at `start`.
pub fn resolve(start: &Path, candidates: &[String], depth: usize) -> Option<PathBuf> {
    let mut level = absolute(start);

    for _ in 0..depth {
        for name in candidates {
            let path = level.join(name);
            if path.is_dir() {
                debug!(path = %path.display(), "figures_folder_found");
                return Some(path);
            }
        }

        match level.parent() {
            Some(parent) => level = parent.to_path_buf(),
            None => break,
        }
    }

    debug!(start = %start.display(), depth, "figures_folder_not_found");
    None
}

/// Create the folder `name` directly inside `start`.
pub fn create_default(start: &Path, name: &str) -> Result<PathBuf> {
    let path = absolute(start).join(name);
    fs::create_dir(&path).map_err(|source| AutoInkError::FolderCreation {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "figures_folder_created");
    Ok(path)
}

/// Resolve the figures folder, creating one named after the first candidate
/// next to `start` when none exists.
pub fn resolve_or_create(start: &Path, candidates: &[String], depth: usize) -> Result<PathBuf> {
    if let Some(found) = resolve(start, candidates, depth) {
        return Ok(found);
    }

    let name = candidates.first().ok_or(AutoInkError::NotFound)?;
    info!(start = %start.display(), name = %name, "figures_folder_missing_creating");
    create_default(start, name)
}

/// Canonical form of `path`, or its lexical absolute form when it does not
/// exist.
pub fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
