//! Bundled files written by `autoink init`.

use std::path::{Path, PathBuf};

use tracing::info;

/// Blank 240mm x 120mm Inkscape canvas with a 5mm grid, used as the default
/// figure template.
pub const DEFAULT_TEMPLATE_SVG: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<svg
   width="240mm"
   height="120mm"
   viewBox="0 0 240 120"
   version="1.1"
   id="svg1"
   xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
   xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd"
   xmlns="http://www.w3.org/2000/svg"
   xmlns:svg="http://www.w3.org/2000/svg">
  <sodipodi:namedview
     id="namedview1"
     pagecolor="#ffffff"
     bordercolor="#666666"
     borderopacity="1.0"
     inkscape:document-units="mm"
     inkscape:pageshadow="2"
     showgrid="true">
    <inkscape:grid
       id="grid1"
       units="mm"
       spacingx="5"
       spacingy="5"
       empspacing="4" />
  </sodipodi:namedview>
  <defs id="defs1" />
  <g
     inkscape:label="Layer 1"
     inkscape:groupmode="layer"
     id="layer1" />
</svg>
"##;

/// Commented project config written to `.autoink`.
pub const PROJECT_CONFIG: &str = r#"# Project-specific autoink config.
# Every key is optional; anything left out comes from the global config.

[figures]
# figures_folders = ["figures", "figs"]
# recursive_check = 2
# fname_delimiter = "_"

[templates]
# templates = "./templates"

[latex]
# latex_command = [
#     "\\begin{{figure}}[ht]",
#     "    \\centering",
#     "    \\includesvg{file_name}",
#     "    \\caption{caption}",
#     "    \\label{fig_name}",
#     "\\end{{figure}}",
# ]

[editor]
# command = "inkscape"
# set_clipboard_on_edit = true
"#;

/// Status of a file for `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitFileStatus {
    /// File will be created (doesn't exist).
    WillCreate,
    /// File already exists (conflict).
    Conflict,
}

#[derive(Debug, Clone)]
pub struct InitFileEntry {
    pub path: PathBuf,
    pub contents: &'static str,
    pub status: InitFileStatus,
}

/// Files `init` would write, with their current status.
#[derive(Debug, Clone)]
pub struct InitPlan {
    pub files: Vec<InitFileEntry>,
}

impl InitPlan {
    /// Plan the default template inside `templates_dir` and a project config
    /// inside `project_dir`.
    pub fn new(templates_dir: &Path, project_dir: &Path) -> Self {
        let files = [
            (templates_dir.join("default.svg"), DEFAULT_TEMPLATE_SVG),
            (
                project_dir.join(crate::config::PROJECT_CONFIG_NAME),
                PROJECT_CONFIG,
            ),
        ]
        .into_iter()
        .map(|(path, contents)| {
            let status = if path.exists() {
                InitFileStatus::Conflict
            } else {
                InitFileStatus::WillCreate
            };
            InitFileEntry {
                path,
                contents,
                status,
            }
        })
        .collect();

        Self { files }
    }

    pub fn conflicting_files(&self) -> Vec<&InitFileEntry> {
        self.files
            .iter()
            .filter(|f| f.status == InitFileStatus::Conflict)
            .collect()
    }

    /// Write the planned files. Conflicts are skipped unless `force` is set.
    /// Returns the paths written.
    pub fn create_files(&self, force: bool) -> Result<Vec<PathBuf>, String> {
        let mut written = Vec::new();

        for file in &self.files {
            if file.status == InitFileStatus::Conflict && !force {
                continue;
            }

            if let Some(parent) = file.path.parent()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    format!("Failed to create directory {}: {}", parent.display(), e)
                })?;
            }

            std::fs::write(&file.path, file.contents)
                .map_err(|e| format!("Failed to write {}: {}", file.path.display(), e))?;
            info!(path = %file.path.display(), "init_file_written");
            written.push(file.path.clone());
        }

        Ok(written)
    }
}
