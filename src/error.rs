//! Error taxonomy for figure creation and editing.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a line of text cannot be used as a figure name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineProblem {
    /// Nothing but whitespace.
    Empty,
    /// Contains `/`, `{` or `}`.
    DisallowedCharacters,
}

impl LineProblem {
    /// Message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Cannot create a figure from an empty line",
            Self::DisallowedCharacters => {
                "Line contains disallowed characters ('/', '{' or '}')"
            }
        }
    }
}

/// Failure while rendering the LaTeX command template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}' in latex_command")]
    UnknownPlaceholder(String),
    #[error("latex_command is missing the '{{{0}}}' placeholder")]
    MissingPlaceholder(&'static str),
    #[error("unclosed '{{' at byte {0} of latex_command")]
    UnclosedBrace(usize),
    #[error("single '}}' at byte {0} of latex_command, use '}}}}' for a literal brace")]
    StrayClosingBrace(usize),
}

#[derive(Debug, Error)]
pub enum AutoInkError {
    #[error("{}", .0.message())]
    InvalidInput(LineProblem),

    #[error("No figures folder found")]
    NotFound,

    #[error("Cannot find templates, path provided is invalid: {}", .0.display())]
    TemplatePathInvalid(PathBuf),

    #[error("Failed to create figures folder {}: {source}", path.display())]
    FolderCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read figures folder {}: {source}", path.display())]
    FolderRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No figures to edit in {}", .0.display())]
    NoFigures(PathBuf),

    #[error("Failed to copy template {} to {}: {source}", template.display(), target.display())]
    Copy {
        template: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid latex_command: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to update document {}: {source}", path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Editor '{0}' not found on PATH, open the figure manually")]
    EditorUnavailable(String),

    #[error("Failed to start editor {}: {source}", editor.display())]
    EditorSpawn {
        editor: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AutoInkError>;
