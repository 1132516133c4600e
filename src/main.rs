mod command;
mod commands;
mod config;
mod error;
mod figure;
mod folders;
mod logging;
mod naming;
mod picker;
mod selection;
mod surface;
mod templates;
mod validators;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use crate::commands::{Collaborators, CommandOutcome};
use crate::config::{LoadedConfig, Settings, contract_home};
use crate::picker::TerminalChooser;
use crate::surface::{
    ClipboardSink, EditorLauncher, FileDocument, NoClipboard, Notifier, PresetInput,
    ScratchDocument, StdinPrompt, SystemClipboard, TerminalNotifier, TextInput,
};
use crate::templates::InitPlan;

/// Insert Inkscape figures into LaTeX documents.
#[derive(Debug, Parser)]
#[command(name = "autoink", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,

    /// Do not copy the LaTeX command to the clipboard
    #[arg(long, global = true)]
    no_clipboard: bool,

    /// Figure editor to launch instead of the configured one
    #[arg(long, global = true, value_name = "CMD")]
    editor: Option<String>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Turn a line of a LaTeX file into a figure
    New {
        /// The LaTeX document
        file: PathBuf,
        /// 1-based line holding the figure name
        #[arg(short, long)]
        line: usize,
    },
    /// Create a figure from a typed name and print its LaTeX command
    Prompt {
        /// Folder to look for the figures folder from (default: current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Figure name; asked on stdin when omitted
        #[arg(long)]
        name: Option<String>,
    },
    /// Open an existing figure in the editor
    Edit {
        /// Document or folder to look for the figures folder from
        path: Option<PathBuf>,
    },
    /// Install the default template and a project `.autoink` file
    Init {
        /// Overwrite files that already exist
        #[arg(long)]
        force: bool,
    },
    /// Show config locations and the effective settings
    Config,
}

impl CliCommand {
    /// Folder the project config and figures folder searches start from.
    fn start_folder(&self) -> PathBuf {
        let cwd = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match self {
            Self::New { file, .. } => parent_folder(file),
            Self::Prompt { dir: Some(dir), .. } => dir.clone(),
            Self::Edit { path: Some(path) } if path.is_file() => parent_folder(path),
            Self::Edit { path: Some(path) } => path.clone(),
            _ => cwd(),
        }
    }
}

fn parent_folder(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn main() -> ExitCode {
    let start_time = Instant::now();
    let cli = Cli::parse();

    let start_folder = cli.command.start_folder();
    let loaded_config = config::load_config(&start_folder);

    let logging = match logging::init(&loaded_config.config.logging.level) {
        Ok(ctx) => {
            logging::cleanup_old_logs(&ctx.log_directory);
            Some(ctx)
        }
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };

    debug!(
        config_path = %loaded_config.config_path.display(),
        project_config = ?loaded_config.project_config_path,
        status = %loaded_config.status.describe(),
        "config_loaded"
    );

    let notifier = TerminalNotifier;
    let code = match run(cli, &loaded_config, &start_folder, &notifier) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "command_failed");
            notifier.notify(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    };

    if let Some(ctx) = logging {
        info!(
            session_id = %ctx.session_id,
            duration_secs = start_time.elapsed().as_secs_f64(),
            "session_end"
        );
    }

    code
}

/// Snapshot the settings for this run, applying command-line overrides.
fn settings_for(cli: &Cli, loaded_config: &LoadedConfig) -> Settings {
    let mut settings = loaded_config.config.settings();
    if cli.no_clipboard {
        settings.set_clipboard_on_edit = false;
    }
    if let Some(editor) = &cli.editor {
        settings.editor = editor.clone();
    }
    settings
}

fn run(
    cli: Cli,
    loaded_config: &LoadedConfig,
    start_folder: &Path,
    notifier: &dyn Notifier,
) -> Result<()> {
    let settings = settings_for(&cli, loaded_config);
    let launcher = EditorLauncher::new(settings.editor.clone());
    let clipboard: Box<dyn ClipboardSink> = if settings.set_clipboard_on_edit {
        Box::new(SystemClipboard)
    } else {
        Box::new(NoClipboard)
    };
    let mut chooser = TerminalChooser;
    let mut ctx = Collaborators {
        notifier,
        launcher: &launcher,
        chooser: &mut chooser,
        clipboard: clipboard.as_ref(),
    };

    match cli.command {
        CliCommand::New { file, line } => {
            let mut document = FileDocument::open(&file, line)?;
            let outcome = commands::new_from_line(&settings, &mut document, &mut ctx)?;
            report(&outcome);
        }
        CliCommand::Prompt { name, .. } => {
            let mut input: Box<dyn TextInput> = match name {
                Some(name) => Box::new(PresetInput(Some(name))),
                None => Box::new(StdinPrompt),
            };
            let mut scratch = ScratchDocument::new(start_folder.to_path_buf());
            let outcome =
                commands::new_from_prompt(&settings, input.as_mut(), &mut scratch, &mut ctx)?;
            if let CommandOutcome::Inserted { .. } = outcome {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", scratch.text()).context("Failed to write LaTeX command")?;
            }
            report(&outcome);
        }
        CliCommand::Edit { .. } => {
            let outcome = commands::edit_existing(&settings, start_folder, &mut ctx)?;
            report(&outcome);
        }
        CliCommand::Init { force } => init(&settings, force)?,
        CliCommand::Config => show_config(loaded_config, &settings)?,
    }

    Ok(())
}

fn report(outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::Inserted {
            figure,
            materialized,
            ..
        } => info!(figure = %figure.display(), result = ?materialized, "figure_inserted"),
        CommandOutcome::Opened(figure) => info!(figure = %figure.display(), "figure_opened"),
        CommandOutcome::Canceled => info!("command_canceled"),
        CommandOutcome::Ignored => info!("command_ignored"),
    }
}

fn init(settings: &Settings, force: bool) -> Result<()> {
    let templates_dir = if settings.templates.extension().is_some_and(|ext| ext == "svg") {
        parent_folder(&settings.templates)
    } else {
        settings.templates.clone()
    };
    let project_dir = std::env::current_dir().context("Cannot determine current directory")?;

    let plan = InitPlan::new(&templates_dir, &project_dir);
    for conflict in plan.conflicting_files() {
        let verb = if force { "Overwriting" } else { "Skipping existing" };
        eprintln!("{} {}", verb, contract_home(&conflict.path));
    }

    let written = plan.create_files(force).map_err(anyhow::Error::msg)?;
    for path in written {
        eprintln!("Created {}", contract_home(&path));
    }
    Ok(())
}

fn show_config(loaded_config: &LoadedConfig, settings: &Settings) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "# config file: {} ({})",
        contract_home(&loaded_config.config_path),
        loaded_config.status.describe()
    )?;
    if let Some(project) = &loaded_config.project_config_path {
        writeln!(stdout, "# project file: {}", contract_home(project))?;
    }
    writeln!(stdout, "# templates resolve to: {}", settings.templates.display())?;
    writeln!(stdout)?;

    let effective =
        toml::to_string_pretty(&loaded_config.config).context("Failed to serialize config")?;
    write!(stdout, "{}", effective)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_new() {
        let cli = Cli::try_parse_from(["autoink", "new", "thesis/ch1.tex", "--line", "12"]).unwrap();
        match &cli.command {
            CliCommand::New { file, line } => {
                assert_eq!(file, &PathBuf::from("thesis/ch1.tex"));
                assert_eq!(*line, 12);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.command.start_folder(), PathBuf::from("thesis"));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "autoink",
            "prompt",
            "--name",
            "Vector Bundle",
            "--no-clipboard",
            "--editor",
            "flatpak-inkscape",
        ])
        .unwrap();
        assert!(cli.no_clipboard);
        assert_eq!(cli.editor.as_deref(), Some("flatpak-inkscape"));
    }

    #[test]
    fn test_new_requires_line() {
        assert!(Cli::try_parse_from(["autoink", "new", "ch1.tex"]).is_err());
    }

    #[test]
    fn test_start_folder_for_bare_file() {
        let cli = Cli::try_parse_from(["autoink", "new", "ch1.tex", "-l", "1"]).unwrap();
        assert_eq!(cli.command.start_folder(), PathBuf::from("."));
    }

    #[test]
    fn test_settings_for_applies_overrides() {
        let cli = Cli::try_parse_from(["autoink", "--no-clipboard", "--editor", "vim", "config"])
            .unwrap();
        let loaded = LoadedConfig {
            config: config::Config::default(),
            config_path: PathBuf::from("config.toml"),
            project_config_path: None,
            status: config::ConfigLoadStatus::Loaded,
        };

        let settings = settings_for(&cli, &loaded);
        assert!(!settings.set_clipboard_on_edit);
        assert_eq!(settings.editor, "vim");
    }
}
