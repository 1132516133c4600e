//! Path checks for the editor command and the templates setting.

use std::path::{Path, PathBuf};

/// What the `templates` setting points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePathKind {
    File,
    Directory,
    Invalid,
}

/// Classify the configured template location.
pub fn classify_template_path(path: &Path) -> TemplatePathKind {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => TemplatePathKind::File,
        Ok(metadata) if metadata.is_dir() => TemplatePathKind::Directory,
        _ => TemplatePathKind::Invalid,
    }
}

/// Check if metadata indicates a valid executable file (pure function).
/// Returns an error message if validation fails, None if valid.
///
/// Parameters:
/// - `is_file`: whether the path is a file
/// - `mode`: Unix permission mode (ignored on non-Unix platforms)
#[allow(unused_variables)]
fn check_executable_metadata(is_file: bool, mode: u32) -> Option<String> {
    if !is_file {
        return Some("Path is not a file".to_string());
    }

    #[cfg(unix)]
    {
        if mode & 0o111 == 0 {
            return Some("File is not executable".to_string());
        }
    }

    None
}

/// Convert an I/O error to an appropriate error message for editor lookup.
fn editor_error_message(error: &std::io::Error) -> String {
    match error.kind() {
        std::io::ErrorKind::NotFound => "Editor not found".to_string(),
        std::io::ErrorKind::PermissionDenied => "Cannot access editor".to_string(),
        _ => "Invalid editor path".to_string(),
    }
}

/// Validate an explicit editor path (one containing a separator).
fn validate_executable_path(path: &Path) -> Result<PathBuf, String> {
    match std::fs::metadata(path) {
        Ok(metadata) => {
            #[cfg(unix)]
            let verdict = {
                use std::os::unix::fs::PermissionsExt;
                check_executable_metadata(metadata.is_file(), metadata.permissions().mode())
            };
            #[cfg(not(unix))]
            let verdict = check_executable_metadata(metadata.is_file(), 0);

            match verdict {
                Some(message) => Err(message),
                None => Ok(path.to_path_buf()),
            }
        }
        Err(e) => Err(editor_error_message(&e)),
    }
}

/// Find the editor binary.
///
/// Bare names such as `inkscape` are looked up on `PATH`; anything with a
/// path separator or a leading `~` is checked in place.
pub fn locate_editor(command: &str) -> Result<PathBuf, String> {
    if command.trim().is_empty() {
        return Err("Editor command cannot be empty".to_string());
    }

    if command.contains(std::path::MAIN_SEPARATOR) || command.starts_with('~') {
        let expanded = crate::config::Config::expand_tilde(command);
        return validate_executable_path(&expanded);
    }

    which::which(command).map_err(|_| format!("'{}' is not on PATH", command))
}
