//! Choosing which template a new figure is copied from.
//!
//! The configured template location is either a single file (used as is) or
//! a directory of templates the user picks from. The pick is the only point
//! where the flow waits on the user, so it is kept as an explicit state.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::figure::{list_figures, stem_of};
use crate::surface::Chooser;
use crate::validators::{TemplatePathKind, classify_template_path};

/// Template that is listed first when present.
pub const DEFAULT_TEMPLATE: &str = "default";

const CHOOSER_PLACEHOLDER: &str = "Choose the template...";

/// A template offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateFlow {
    Start(PathBuf),
    SingleTemplate(PathBuf),
    AwaitingChoice(Vec<TemplateEntry>),
    Resolved(PathBuf),
    Canceled,
    InvalidPath(PathBuf),
}

impl TemplateFlow {
    pub fn new(configured: &Path) -> Self {
        Self::Start(configured.to_path_buf())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Resolved(_) | Self::Canceled | Self::InvalidPath(_)
        )
    }

    /// Labels to show while awaiting a choice.
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::AwaitingChoice(entries) => entries.iter().map(|e| e.name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    /// Apply the user's pick. Only meaningful while awaiting a choice;
    /// `None` or an index past the end cancels.
    pub fn choose(self, choice: Option<usize>) -> Self {
        let Self::AwaitingChoice(entries) = self else {
            return self;
        };

        match choice.and_then(|idx| entries.get(idx)) {
            Some(entry) => {
                info!(template = %entry.name, "template_chosen");
                Self::Resolved(entry.path.clone())
            }
            None => {
                info!(choice = ?choice, "template_choice_canceled");
                Self::Canceled
            }
        }
    }

    /// Take one step that needs no user input.
    fn step(self) -> Self {
        match self {
            Self::Start(path) => match classify_template_path(&path) {
                TemplatePathKind::File => Self::SingleTemplate(path),
                TemplatePathKind::Directory => match list_templates(&path) {
                    Ok(entries) => Self::AwaitingChoice(entries),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "template_dir_unreadable");
                        Self::InvalidPath(path)
                    }
                },
                TemplatePathKind::Invalid => Self::InvalidPath(path),
            },
            Self::SingleTemplate(path) => Self::Resolved(path),
            other => other,
        }
    }

    /// Drive the flow to a terminal state, asking `chooser` when a pick is
    /// needed.
    pub fn run(mut self, chooser: &mut dyn Chooser) -> Self {
        while !self.is_terminal() {
            self = match self {
                Self::AwaitingChoice(_) => {
                    let labels = self.labels();
                    let choice = chooser.choose(CHOOSER_PLACEHOLDER, &labels);
                    self.choose(choice)
                }
                other => other.step(),
            };
            debug!(state = ?self, "template_flow_step");
        }
        self
    }
}

/// Templates in `dir`, with the default template moved to the front.
///
/// The rest are sorted by name so the list is stable across filesystems.
pub fn list_templates(dir: &Path) -> std::io::Result<Vec<TemplateEntry>> {
    let mut entries: Vec<TemplateEntry> = list_figures(dir)?
        .into_iter()
        .map(|path| TemplateEntry {
            name: stem_of(&path),
            path,
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    if let Some(pos) = entries.iter().position(|e| e.name == DEFAULT_TEMPLATE) {
        let default = entries.remove(pos);
        entries.insert(0, default);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::ScriptedChooser;
    use std::fs;
    use tempfile::TempDir;

    fn template_dir(names: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for name in names {
            fs::write(tmp.path().join(name), format!("<svg id=\"{}\"/>", name)).unwrap();
        }
        tmp
    }

    #[test]
    fn test_list_templates_default_first() {
        let tmp = template_dir(&["axes.svg", "default.svg", "blank.svg", "notes.txt"]);
        let names: Vec<String> = list_templates(tmp.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["default", "axes", "blank"]);
    }

    #[test]
    fn test_list_templates_default_is_case_sensitive() {
        let tmp = template_dir(&["Default.svg", "b.svg"]);
        let names: Vec<String> = list_templates(tmp.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Default", "b"]);
    }

    #[test]
    fn test_start_with_invalid_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");
        let mut chooser = ScriptedChooser::default();

        let end = TemplateFlow::new(&missing).run(&mut chooser);

        assert_eq!(end, TemplateFlow::InvalidPath(missing));
        assert!(chooser.offered.is_empty());
    }

    #[test]
    fn test_single_file_needs_no_choice() {
        let tmp = template_dir(&["only.svg"]);
        let file = tmp.path().join("only.svg");
        let mut chooser = ScriptedChooser::default();

        let end = TemplateFlow::new(&file).run(&mut chooser);

        assert_eq!(end, TemplateFlow::Resolved(file));
        assert!(chooser.offered.is_empty());
    }

    #[test]
    fn test_directory_resolves_on_choice() {
        let tmp = template_dir(&["default.svg", "other.svg"]);
        let mut chooser = ScriptedChooser::answering(&[Some(1)]);

        let end = TemplateFlow::new(tmp.path()).run(&mut chooser);

        assert_eq!(chooser.offered, vec![vec!["default", "other"]]);
        assert_eq!(end, TemplateFlow::Resolved(tmp.path().join("other.svg")));
    }

    #[test]
    fn test_directory_cancel() {
        let tmp = template_dir(&["default.svg", "other.svg"]);
        let mut chooser = ScriptedChooser::answering(&[None]);

        let end = TemplateFlow::new(tmp.path()).run(&mut chooser);

        assert_eq!(end, TemplateFlow::Canceled);
    }

    #[test]
    fn test_out_of_range_choice_cancels() {
        let flow = TemplateFlow::AwaitingChoice(vec![TemplateEntry {
            name: "default".to_string(),
            path: PathBuf::from("/t/default.svg"),
        }]);
        assert_eq!(flow.choose(Some(3)), TemplateFlow::Canceled);
    }

    #[test]
    fn test_empty_directory_cancels() {
        let tmp = template_dir(&["readme.txt"]);
        let mut chooser = ScriptedChooser::answering(&[Some(0)]);

        let end = TemplateFlow::new(tmp.path()).run(&mut chooser);

        assert_eq!(chooser.offered, vec![Vec::<String>::new()]);
        assert_eq!(end, TemplateFlow::Canceled);
    }

    #[test]
    fn test_choose_outside_awaiting_is_noop() {
        let flow = TemplateFlow::Resolved(PathBuf::from("/t/a.svg"));
        assert_eq!(flow.clone().choose(Some(0)), flow);
    }
}
