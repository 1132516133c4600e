//! Creating figure files from templates.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{AutoInkError, Result};
use crate::surface::Launcher;

/// Extension of figure and template files.
pub const FIGURE_EXT: &str = "svg";

/// Outcome of [`materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// Template copied and the editor launched.
    Created,
    /// Template copied, but the editor could not be started.
    CreatedWithoutEditor(String),
    /// The target already existed and was left alone.
    AlreadyExisted,
}

/// Path of the figure file named `slug` inside `folder`.
pub fn target_path(folder: &Path, slug: &str) -> PathBuf {
    folder.join(format!("{}.{}", slug, FIGURE_EXT))
}

/// Copy `template` to `target` and open it in the editor, unless `target`
/// is already a file.
///
/// A failed copy is returned as an error and the editor is not launched.
/// A copy interrupted half-way may leave a partial file behind.
pub fn materialize(template: &Path, target: &Path, launcher: &dyn Launcher) -> Result<Materialized> {
    if target.is_file() {
        debug!(target = %target.display(), "figure_exists");
        return Ok(Materialized::AlreadyExisted);
    }

    fs::copy(template, target).map_err(|source| AutoInkError::Copy {
        template: template.to_path_buf(),
        target: target.to_path_buf(),
        source,
    })?;
    preserve_mtime(template, target);
    info!(
        template = %template.display(),
        target = %target.display(),
        "figure_created"
    );

    match launcher.launch(target) {
        Ok(()) => Ok(Materialized::Created),
        Err(e) => {
            warn!(target = %target.display(), error = %e, "editor_launch_skipped");
            Ok(Materialized::CreatedWithoutEditor(e.to_string()))
        }
    }
}

/// Carry the template's modification time over to the copy.
fn preserve_mtime(template: &Path, target: &Path) {
    let modified = match fs::metadata(template).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return,
    };
    let result = fs::File::options()
        .write(true)
        .open(target)
        .and_then(|file| file.set_modified(modified));
    if let Err(e) = result {
        debug!(target = %target.display(), error = %e, "figure_mtime_not_preserved");
    }
}

/// Figure files directly inside `folder`, most recently modified first.
pub fn figures_by_recency(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut figures: Vec<(PathBuf, Option<std::time::SystemTime>)> = list_figures(folder)?
        .into_iter()
        .map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
            (path, modified)
        })
        .collect();

    // Newest first, unknown timestamps last
    figures.sort_by(|(_, a), (_, b)| match (b, a) {
        (Some(b_ts), Some(a_ts)) => b_ts.cmp(a_ts),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => std::cmp::Ordering::Equal,
    });

    Ok(figures.into_iter().map(|(path, _)| path).collect())
}

/// Files with the figure extension directly inside `folder`, in directory
/// enumeration order.
pub fn list_figures(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut figures = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let is_figure = path.extension().is_some_and(|ext| ext == FIGURE_EXT);
        if is_figure && path.is_file() {
            figures.push(path);
        }
    }
    Ok(figures)
}

/// File stem used as a label in choosers.
pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
