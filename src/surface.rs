//! Interfaces to the world outside the figure logic: the document being
//! edited, the figure editor, user prompts and the clipboard.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{AutoInkError, Result};
use crate::validators::locate_editor;

/// Extensions of documents figures can be inserted into.
const LATEX_EXTENSIONS: &[&str] = &["tex", "ltx", "latex"];

/// The text buffer a figure command is written into.
pub trait TextSurface {
    /// Full text of the line under the cursor.
    fn current_line(&self) -> String;
    /// Replace the line under the cursor; `text` may span several lines.
    fn replace_current_line(&mut self, text: &str) -> Result<()>;
    /// Folder the figures folder search starts from.
    fn folder(&self) -> PathBuf;
    /// Whether this is a LaTeX document.
    fn is_recognized(&self) -> bool;
}

pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Opens a figure in the external editor without waiting for it.
pub trait Launcher {
    fn launch(&self, path: &Path) -> Result<()>;
}

/// Lets the user pick one of `labels`; `None` means the pick was canceled.
pub trait Chooser {
    fn choose(&mut self, placeholder: &str, labels: &[String]) -> Option<usize>;
}

/// Asks the user for a line of free text; `None` means canceled.
pub trait TextInput {
    fn prompt(&mut self, caption: &str) -> Option<String>;
}

pub trait ClipboardSink {
    fn set_text(&self, text: &str);
}

/// A LaTeX file on disk with a cursor on one of its lines.
#[derive(Debug)]
pub struct FileDocument {
    path: PathBuf,
    lines: Vec<String>,
    cursor: usize,
    line_ending: &'static str,
    trailing_newline: bool,
}

impl FileDocument {
    /// Load `path` with the cursor on 1-based line `line`.
    pub fn open(path: &Path, line: usize) -> Result<Self> {
        let document_error = |source| AutoInkError::Document {
            path: path.to_path_buf(),
            source,
        };
        let contents = fs::read_to_string(path).map_err(document_error)?;
        let mut doc = Self::from_contents(path, &contents);

        if line == 0 || line > doc.lines.len() {
            return Err(document_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("line {} is outside the document ({} lines)", line, doc.lines.len()),
            )));
        }
        doc.cursor = line - 1;
        Ok(doc)
    }

    fn from_contents(path: &Path, contents: &str) -> Self {
        let line_ending = if contents.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = contents.ends_with('\n');
        let body = contents.strip_suffix(line_ending).unwrap_or(contents);
        let lines = body.split(line_ending).map(String::from).collect();

        Self {
            path: path.to_path_buf(),
            lines,
            cursor: 0,
            line_ending,
            trailing_newline,
        }
    }

    fn contents(&self) -> String {
        let mut contents = self.lines.join(self.line_ending);
        if self.trailing_newline {
            contents.push_str(self.line_ending);
        }
        contents
    }
}

impl TextSurface for FileDocument {
    fn current_line(&self) -> String {
        self.lines[self.cursor].clone()
    }

    fn replace_current_line(&mut self, text: &str) -> Result<()> {
        let replacement = text.replace('\n', self.line_ending);
        self.lines[self.cursor] = replacement;

        fs::write(&self.path, self.contents()).map_err(|source| AutoInkError::Document {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), line = self.cursor + 1, "document_line_replaced");
        Ok(())
    }

    fn folder(&self) -> PathBuf {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn is_recognized(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| LATEX_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    }
}

/// A fresh, unsaved buffer rooted at a folder.
#[derive(Debug, Default)]
pub struct ScratchDocument {
    folder: PathBuf,
    text: String,
}

impl ScratchDocument {
    pub fn new(folder: PathBuf) -> Self {
        Self {
            folder,
            text: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl TextSurface for ScratchDocument {
    fn current_line(&self) -> String {
        self.text.lines().last().unwrap_or_default().to_string()
    }

    fn replace_current_line(&mut self, text: &str) -> Result<()> {
        self.text = text.to_string();
        Ok(())
    }

    fn folder(&self) -> PathBuf {
        self.folder.clone()
    }

    fn is_recognized(&self) -> bool {
        true
    }
}

/// Prints notifications on stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        warn!(message = %message, "notification");
        eprintln!("autoink: {}", message);
    }
}

/// Starts `<editor> <figure>` as a detached process.
pub struct EditorLauncher {
    command: String,
}

impl EditorLauncher {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Launcher for EditorLauncher {
    fn launch(&self, path: &Path) -> Result<()> {
        let editor = locate_editor(&self.command).map_err(|reason| {
            debug!(editor = %self.command, reason = %reason, "editor_lookup_failed");
            AutoInkError::EditorUnavailable(self.command.clone())
        })?;

        let child = Command::new(&editor)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match child {
            Ok(child) => {
                info!(editor = %editor.display(), pid = child.id(), path = %path.display(), "editor_launched");
                Ok(())
            }
            Err(source) => {
                warn!(editor = %editor.display(), error = %source, "editor_spawn_failed");
                Err(AutoInkError::EditorSpawn { editor, source })
            }
        }
    }
}

/// Reads one line from stdin after printing the caption on stderr.
pub struct StdinPrompt;

impl TextInput for StdinPrompt {
    fn prompt(&mut self, caption: &str) -> Option<String> {
        eprint!("{} ", caption);
        let _ = io::stderr().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                warn!(error = %e, "prompt_read_failed");
                None
            }
        }
    }
}

/// Input whose answer is known up front, e.g. from a command-line flag.
pub struct PresetInput(pub Option<String>);

impl TextInput for PresetInput {
    fn prompt(&mut self, caption: &str) -> Option<String> {
        debug!(caption = %caption, "prompt_answered_from_preset");
        self.0.take()
    }
}

/// The system clipboard. Failures are logged and otherwise ignored.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) {
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => debug!(len = text.len(), "clipboard_set"),
            Err(e) => warn!(error = %e, "clipboard_unavailable"),
        }
    }
}

/// Clipboard used when `set_clipboard_on_edit` is off.
pub struct NoClipboard;

impl ClipboardSink for NoClipboard {
    fn set_text(&self, _text: &str) {}
}
