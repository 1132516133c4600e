//! The user-facing commands: create a figure from a document line, create
//! one from prompted text, and open an existing figure.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::command::{render, validate};
use crate::config::Settings;
use crate::error::{AutoInkError, Result};
use crate::figure::{Materialized, figures_by_recency, materialize, stem_of, target_path};
use crate::folders;
use crate::naming::FigureRequest;
use crate::selection::TemplateFlow;
use crate::surface::{Chooser, ClipboardSink, Launcher, Notifier, TextInput, TextSurface};

const PROMPT_CAPTION: &str = "Name of new figure:";
const EDIT_PLACEHOLDER: &str = "Choose the Inkscape file to edit...";

/// The interactive pieces a command talks to.
pub struct Collaborators<'a> {
    pub notifier: &'a dyn Notifier,
    pub launcher: &'a dyn Launcher,
    pub chooser: &'a mut dyn Chooser,
    pub clipboard: &'a dyn ClipboardSink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The LaTeX command was inserted for the figure at `figure`.
    Inserted {
        figure: PathBuf,
        command: String,
        materialized: Materialized,
    },
    /// An existing figure was opened.
    Opened(PathBuf),
    /// The user backed out; nothing changed.
    Canceled,
    /// The document is not LaTeX; nothing changed.
    Ignored,
}

/// Create a figure named after the line under the cursor and replace the
/// line with the LaTeX command for it.
pub fn new_from_line(
    settings: &Settings,
    surface: &mut dyn TextSurface,
    ctx: &mut Collaborators<'_>,
) -> Result<CommandOutcome> {
    if !surface.is_recognized() {
        info!("Ignoring new figure command since document is not LaTeX");
        return Ok(CommandOutcome::Ignored);
    }

    let line = surface.current_line();
    make_new_figure(settings, &line, surface, ctx)
}

/// Ask for a figure name and write the LaTeX command into `scratch`.
pub fn new_from_prompt(
    settings: &Settings,
    input: &mut dyn TextInput,
    scratch: &mut dyn TextSurface,
    ctx: &mut Collaborators<'_>,
) -> Result<CommandOutcome> {
    let Some(text) = input.prompt(PROMPT_CAPTION) else {
        debug!("figure_prompt_canceled");
        return Ok(CommandOutcome::Canceled);
    };

    make_new_figure(settings, &text, scratch, ctx)
}

/// Shared pipeline of both "new figure" commands.
fn make_new_figure(
    settings: &Settings,
    text: &str,
    surface: &mut dyn TextSurface,
    ctx: &mut Collaborators<'_>,
) -> Result<CommandOutcome> {
    let request = FigureRequest::from_text(text, settings.fname_delimiter)?;
    info!(
        name = %request.display_name,
        slug = %request.slug,
        caption = %request.caption,
        "new_figure"
    );
    validate(&settings.latex_command)?;

    let figures_folder = folders::resolve_or_create(
        &surface.folder(),
        &settings.figures_folders,
        settings.recursive_check,
    )?;
    let target = target_path(&figures_folder, &request.slug);

    let template = match TemplateFlow::new(&settings.templates).run(&mut *ctx.chooser) {
        TemplateFlow::Resolved(template) => template,
        TemplateFlow::InvalidPath(path) => return Err(AutoInkError::TemplatePathInvalid(path)),
        _ => {
            info!("Template copying canceled");
            return Ok(CommandOutcome::Canceled);
        }
    };

    let command = render(
        &settings.latex_command,
        &request.display_name,
        &request.slug,
        request.indent(),
    )?;
    surface.replace_current_line(&command)?;

    let materialized = materialize(&template, &target, ctx.launcher)?;
    if let Materialized::CreatedWithoutEditor(reason) = &materialized {
        ctx.notifier.notify(reason);
    }

    if settings.set_clipboard_on_edit {
        ctx.clipboard.set_text(&command);
    }

    Ok(CommandOutcome::Inserted {
        figure: target,
        command,
        materialized,
    })
}

/// Let the user pick an existing figure near `start` and open it.
pub fn edit_existing(
    settings: &Settings,
    start: &Path,
    ctx: &mut Collaborators<'_>,
) -> Result<CommandOutcome> {
    let figures_folder =
        folders::resolve(start, &settings.figures_folders, settings.recursive_check)
            .ok_or(AutoInkError::NotFound)?;

    let figures = figures_by_recency(&figures_folder).map_err(|source| {
        AutoInkError::FolderRead {
            path: figures_folder.clone(),
            source,
        }
    })?;
    if figures.is_empty() {
        return Err(AutoInkError::NoFigures(figures_folder));
    }

    let names: Vec<String> = figures.iter().map(|path| stem_of(path)).collect();
    let Some(choice) = ctx.chooser.choose(EDIT_PLACEHOLDER, &names) else {
        return Ok(CommandOutcome::Canceled);
    };
    let Some(path) = figures.get(choice) else {
        warn!(choice, options = figures.len(), "figure_choice_out_of_range");
        return Ok(CommandOutcome::Canceled);
    };
    let name = &names[choice];

    info!(figure = %name, "editing_figure");
    if let Err(e) = ctx.launcher.launch(path) {
        ctx.notifier.notify(&e.to_string());
    }

    if settings.set_clipboard_on_edit {
        let command = render(&settings.latex_command, name, name, 0)?;
        ctx.clipboard.set_text(&command);
    }

    Ok(CommandOutcome::Opened(path.clone()))
}
