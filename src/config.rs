use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the per-project override file.
pub const PROJECT_CONFIG_NAME: &str = ".autoink";

/// Status of config file loading
#[derive(Debug, Clone)]
pub enum ConfigLoadStatus {
    /// Config loaded successfully from existing file
    Loaded,
    /// Created default config file (first run)
    Created,
    /// Error occurred during loading, using defaults.
    Error(String),
}

impl ConfigLoadStatus {
    /// Short description for `autoink config`.
    pub fn describe(&self) -> String {
        match self {
            Self::Loaded => "loaded".to_string(),
            Self::Created => "created with defaults".to_string(),
            Self::Error(reason) => format!("using defaults: {}", reason),
        }
    }
}

/// Where figures live and how their files are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiguresConfig {
    /// Candidate folder names, most preferred first. The first one is
    /// created when none exists.
    pub figures_folders: Vec<String>,
    /// Number of folders (the document's and its parents) searched.
    pub recursive_check: usize,
    pub fname_delimiter: String,
}

impl Default for FiguresConfig {
    fn default() -> Self {
        Self {
            figures_folders: default_figures_folders(),
            recursive_check: 2,
            fname_delimiter: "_".to_string(),
        }
    }
}

fn default_figures_folders() -> Vec<String> {
    ["figures", "figs", "fig", "res", "img", "plots"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Template location: a single SVG file or a folder of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub templates: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        let templates = default_templates_dir()
            .map(|p| contract_home(&p))
            .unwrap_or_else(|| "~/.config/autoink/templates".to_string());
        Self { templates }
    }
}

/// LaTeX inserted for each figure, one entry per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatexConfig {
    pub latex_command: Vec<String>,
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            latex_command: [
                "\\begin{{figure}}[ht]",
                "    \\centering",
                "    \\includesvg{file_name}",
                "    \\caption{caption}",
                "    \\label{fig_name}",
                "\\end{{figure}}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Figure editor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub command: String,
    /// Copy the LaTeX command to the clipboard after creating or opening a
    /// figure.
    pub set_clipboard_on_edit: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            command: "inkscape".to_string(),
            set_clipboard_on_edit: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub figures: FiguresConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub latex: LatexConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Expand `~` to home directory in a path string
    pub fn expand_tilde(path: &str) -> PathBuf {
        if path == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        } else if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }

    /// Get the expanded template path
    pub fn templates_path(&self) -> PathBuf {
        Self::expand_tilde(&self.templates.templates)
    }

    /// Build the immutable settings used by one command.
    pub fn settings(&self) -> Settings {
        let figures_folders = if self.figures.figures_folders.is_empty() {
            warn!("figures_folders is empty, using defaults");
            default_figures_folders()
        } else {
            self.figures.figures_folders.clone()
        };

        let recursive_check = if self.figures.recursive_check == 0 {
            warn!("recursive_check must be at least 1, using 1");
            1
        } else {
            self.figures.recursive_check
        };

        let mut delimiter_chars = self.figures.fname_delimiter.chars();
        let fname_delimiter = match (delimiter_chars.next(), delimiter_chars.next()) {
            (Some(c), None) if !c.is_whitespace() && !"/{}.'".contains(c) => c,
            _ => {
                warn!(
                    delimiter = %self.figures.fname_delimiter,
                    "fname_delimiter must be a single filename-safe character, using '_'"
                );
                '_'
            }
        };

        Settings {
            figures_folders,
            recursive_check,
            templates: self.templates_path(),
            latex_command: self.latex.latex_command.join("\n"),
            fname_delimiter,
            set_clipboard_on_edit: self.editor.set_clipboard_on_edit,
            editor: self.editor.command.clone(),
        }
    }
}

/// Settings snapshot taken at the start of every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub figures_folders: Vec<String>,
    pub recursive_check: usize,
    pub templates: PathBuf,
    /// Lines of `latex.latex_command` joined with newlines.
    pub latex_command: String,
    pub fname_delimiter: char,
    pub set_clipboard_on_edit: bool,
    pub editor: String,
}

/// Partial figures configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialFiguresConfig {
    pub figures_folders: Option<Vec<String>>,
    pub recursive_check: Option<usize>,
    pub fname_delimiter: Option<String>,
}

/// Partial templates configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialTemplatesConfig {
    pub templates: Option<String>,
}

/// Partial LaTeX configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLatexConfig {
    pub latex_command: Option<Vec<String>>,
}

/// Partial editor configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialEditorConfig {
    pub command: Option<String>,
    pub set_clipboard_on_edit: Option<bool>,
}

/// Partial logging configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLoggingConfig {
    pub level: Option<String>,
}

/// Project-specific configuration where every field is optional.
/// Parsed from `.autoink` files. Fields that are `None` inherit from the global config.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialConfig {
    pub figures: PartialFiguresConfig,
    pub templates: PartialTemplatesConfig,
    pub latex: PartialLatexConfig,
    pub editor: PartialEditorConfig,
    pub logging: PartialLoggingConfig,
}

/// Merge a global config with a project-level partial config.
/// Project values override global values where present.
pub fn merge_config(global: &Config, project: &PartialConfig) -> Config {
    Config {
        figures: FiguresConfig {
            figures_folders: project
                .figures
                .figures_folders
                .clone()
                .unwrap_or_else(|| global.figures.figures_folders.clone()),
            recursive_check: project
                .figures
                .recursive_check
                .unwrap_or(global.figures.recursive_check),
            fname_delimiter: project
                .figures
                .fname_delimiter
                .clone()
                .unwrap_or_else(|| global.figures.fname_delimiter.clone()),
        },
        templates: TemplatesConfig {
            templates: project
                .templates
                .templates
                .clone()
                .unwrap_or_else(|| global.templates.templates.clone()),
        },
        latex: LatexConfig {
            latex_command: project
                .latex
                .latex_command
                .clone()
                .unwrap_or_else(|| global.latex.latex_command.clone()),
        },
        editor: EditorConfig {
            command: project
                .editor
                .command
                .clone()
                .unwrap_or_else(|| global.editor.command.clone()),
            set_clipboard_on_edit: project
                .editor
                .set_clipboard_on_edit
                .unwrap_or(global.editor.set_clipboard_on_edit),
        },
        logging: LoggingConfig {
            level: project
                .logging
                .level
                .clone()
                .unwrap_or_else(|| global.logging.level.clone()),
        },
    }
}

/// Loaded configuration with metadata
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub project_config_path: Option<PathBuf>,
    pub status: ConfigLoadStatus,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "autoink", "autoink")
}

/// Get the full path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Default location of the template folder.
pub fn default_templates_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("templates"))
}

/// Replace the home directory prefix with `~`.
pub fn contract_home(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(suffix) = path.strip_prefix(&home)
    {
        return format!("~/{}", suffix.display());
    }
    path.display().to_string()
}

/// Find a `.autoink` file in `start` or up to `depth - 1` of its parents.
///
/// `start` is made absolute first, so `.` walks the real parent folders.
pub fn find_project_config(start: &Path, depth: usize) -> Option<PathBuf> {
    crate::folders::absolute(start)
        .ancestors()
        .take(depth.max(1))
        .map(|dir| dir.join(PROJECT_CONFIG_NAME))
        .find(|candidate| candidate.is_file())
}

/// Load a project config (.autoink) from the given path.
/// Returns Ok(PartialConfig) on success, Err(String) on parse/read failure.
fn load_project_config(path: &Path) -> Result<PartialConfig, String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_read_failed");
        format!("Failed to read .autoink: {}", e)
    })?;

    toml::from_str::<PartialConfig>(&contents).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_parse_failed");
        format!("Invalid .autoink: {}", e)
    })
}

/// Load configuration from file, environment, and defaults.
///
/// `document_folder` is where the project `.autoink` search starts.
pub fn load_config(document_folder: &Path) -> LoadedConfig {
    let (config, config_path, status) = match get_config_path() {
        Some(path) => {
            debug!(path = %path.display(), "config_path");
            let (config, status) = load_or_create_config(&path);
            (config, path, status)
        }
        None => {
            warn!("config_dir_unknown_using_defaults");
            (
                Config::default(),
                PathBuf::from("config.toml"),
                ConfigLoadStatus::Error("Could not determine config directory".to_string()),
            )
        }
    };

    let (config, project_config_path) = apply_project_config(config, document_folder);

    LoadedConfig {
        config: apply_env_overrides(config),
        config_path,
        project_config_path,
        status,
    }
}

/// Resolve a relative path from a project file against the folder holding it.
/// Absolute paths and `~` paths are kept as written.
fn anchor_to(project_dir: &Path, value: &str) -> String {
    if value.starts_with('~') || Path::new(value).is_absolute() {
        return value.to_string();
    }
    project_dir.join(value).to_string_lossy().into_owned()
}

/// Merge the nearest `.autoink` above `document_folder` into `config`.
fn apply_project_config(config: Config, document_folder: &Path) -> (Config, Option<PathBuf>) {
    let depth = config.figures.recursive_check;
    let Some(project_path) = find_project_config(document_folder, depth) else {
        return (config, None);
    };

    match load_project_config(&project_path) {
        Ok(mut partial) => {
            info!(path = ?project_path, "project_config_loaded");
            if let (Some(templates), Some(project_dir)) =
                (partial.templates.templates.as_mut(), project_path.parent())
            {
                *templates = anchor_to(project_dir, templates);
            }
            (merge_config(&config, &partial), Some(project_path))
        }
        Err(e) => {
            warn!(path = ?project_path, error = %e, "project_config_error");
            // Keep using global config only
            (config, Some(project_path))
        }
    }
}

/// Read the global config, writing the defaults on first run.
fn load_or_create_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return create_default_config(config_path),
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "config_unreadable");
            let reason = if e.kind() == io::ErrorKind::PermissionDenied {
                "Permission denied reading config".to_string()
            } else {
                format!("Read error: {}", e)
            };
            return (Config::default(), ConfigLoadStatus::Error(reason));
        }
    };

    match toml::from_str::<Config>(&contents) {
        Ok(config) => {
            info!(path = %config_path.display(), "config_loaded_from_file");
            (config, ConfigLoadStatus::Loaded)
        }
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "config_malformed_using_defaults");
            (
                Config::default(),
                ConfigLoadStatus::Error(format!("Malformed TOML: {}", e)),
            )
        }
    }
}

/// Write `Config::default()` to `config_path`. The defaults are used even
/// when writing fails.
fn create_default_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    let config = Config::default();

    let written = config_path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .map_err(|e| format!("Could not create config directory: {}", e))
        .and_then(|()| {
            toml::to_string_pretty(&config).map_err(|e| format!("Serialization error: {}", e))
        })
        .and_then(|toml_content| {
            fs::write(config_path, toml_content).map_err(|e| format!("Write error: {}", e))
        });

    match written {
        Ok(()) => {
            info!(path = %config_path.display(), "config_created");
            (config, ConfigLoadStatus::Created)
        }
        Err(reason) => {
            warn!(path = %config_path.display(), reason = %reason, "config_not_written");
            (config, ConfigLoadStatus::Error(reason))
        }
    }
}

/// Apply environment variable overrides to config
fn apply_env_overrides(mut config: Config) -> Config {
    let overrides: [(&str, &mut String); 3] = [
        ("AUTOINK_TEMPLATES", &mut config.templates.templates),
        ("AUTOINK_EDITOR", &mut config.editor.command),
        ("AUTOINK_LOG", &mut config.logging.level),
    ];
    for (var, field) in overrides {
        if let Ok(value) = env::var(var) {
            debug!(var, value = %value, "config_env_override");
            *field = value;
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.figures.figures_folders[0], "figures");
        assert_eq!(config.figures.recursive_check, 2);
        assert_eq!(config.figures.fname_delimiter, "_");
        assert_eq!(config.editor.command, "inkscape");
        assert!(config.editor.set_clipboard_on_edit);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_latex_command_renders() {
        let settings = Config::default().settings();
        assert!(crate::command::validate(&settings.latex_command).is_ok());
        assert!(settings.latex_command.starts_with("\\begin{{figure}}"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = Config::expand_tilde("~/.config/test");
        assert!(!expanded.to_string_lossy().starts_with('~'));

        let no_tilde = Config::expand_tilde("/absolute/path");
        assert_eq!(no_tilde, PathBuf::from("/absolute/path"));

        let relative = Config::expand_tilde("./relative/path");
        assert_eq!(relative, PathBuf::from("./relative/path"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
[figures]
figures_folders = ["img", "figures"]
recursive_check = 3
fname_delimiter = "-"

[templates]
templates = "/opt/templates"

[latex]
latex_command = ["\\incfig{file_name}{caption}{fig_name}"]

[editor]
command = "/usr/bin/inkscape"
set_clipboard_on_edit = false
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.figures.figures_folders, vec!["img", "figures"]);
        assert_eq!(config.figures.recursive_check, 3);
        assert_eq!(config.templates.templates, "/opt/templates");
        assert_eq!(config.latex.latex_command.len(), 1);
        assert!(!config.editor.set_clipboard_on_edit);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let toml_str = r#"
[editor]
command = "inkscape-beta"
unknown_key = "should be ignored"

[unknown_section]
foo = "bar"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.editor.command, "inkscape-beta");
    }

    #[test]
    fn test_settings_snapshot() {
        let mut config = Config::default();
        config.latex.latex_command = vec!["a{file_name}".to_string(), "b".to_string()];
        config.figures.fname_delimiter = "-".to_string();

        let settings = config.settings();
        assert_eq!(settings.latex_command, "a{file_name}\nb");
        assert_eq!(settings.fname_delimiter, '-');
        assert_eq!(settings.editor, "inkscape");
    }

    #[test]
    fn test_settings_normalizes_bad_values() {
        let mut config = Config::default();
        config.figures.figures_folders.clear();
        config.figures.recursive_check = 0;
        config.figures.fname_delimiter = "--".to_string();

        let settings = config.settings();
        assert_eq!(settings.figures_folders[0], "figures");
        assert_eq!(settings.recursive_check, 1);
        assert_eq!(settings.fname_delimiter, '_');

        config.figures.fname_delimiter = " ".to_string();
        assert_eq!(config.settings().fname_delimiter, '_');
        config.figures.fname_delimiter = "/".to_string();
        assert_eq!(config.settings().fname_delimiter, '_');
    }

    #[test]
    fn test_partial_config_empty() {
        let partial: PartialConfig = toml::from_str("").unwrap();
        assert!(partial.figures.figures_folders.is_none());
        assert!(partial.templates.templates.is_none());
        assert!(partial.latex.latex_command.is_none());
        assert!(partial.editor.set_clipboard_on_edit.is_none());
    }

    #[test]
    fn test_merge_config_partial_overrides() {
        let global = Config::default();
        let partial: PartialConfig = toml::from_str(
            r#"
[figures]
figures_folders = ["plots"]

[editor]
set_clipboard_on_edit = false
"#,
        )
        .unwrap();
        let merged = merge_config(&global, &partial);

        assert_eq!(merged.figures.figures_folders, vec!["plots"]);
        assert!(!merged.editor.set_clipboard_on_edit);

        assert_eq!(merged.figures.recursive_check, global.figures.recursive_check);
        assert_eq!(merged.templates.templates, global.templates.templates);
        assert_eq!(merged.editor.command, global.editor.command);
        assert_eq!(merged.latex.latex_command, global.latex.latex_command);
    }

    #[test]
    fn test_find_project_config_walks_up() {
        let tmp = TempDir::new().unwrap();
        let chapter = tmp.path().join("chapters");
        fs::create_dir(&chapter).unwrap();
        fs::write(tmp.path().join(PROJECT_CONFIG_NAME), "").unwrap();

        assert_eq!(
            find_project_config(&chapter, 2),
            Some(fs::canonicalize(tmp.path()).unwrap().join(PROJECT_CONFIG_NAME))
        );
        assert_eq!(find_project_config(&chapter, 1), None);
    }

    #[test]
    fn test_find_project_config_from_relative_start() {
        let tmp = TempDir::new().unwrap();
        let chapter = tmp.path().join("chapters");
        fs::create_dir(&chapter).unwrap();
        fs::write(tmp.path().join(PROJECT_CONFIG_NAME), "").unwrap();
        let expected = fs::canonicalize(tmp.path()).unwrap().join(PROJECT_CONFIG_NAME);

        // A folder given with `..` still walks its real parents.
        let detour = chapter.join("..").join("chapters");
        assert_eq!(find_project_config(&detour, 2), Some(expected.clone()));

        let original_cwd = env::current_dir().unwrap();
        env::set_current_dir(&chapter).unwrap();
        let found = find_project_config(Path::new("."), 2);
        env::set_current_dir(original_cwd).unwrap();

        assert_eq!(found, Some(expected));
    }

    #[test]
    fn test_apply_project_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(PROJECT_CONFIG_NAME),
            "[templates]\ntemplates = \"./tpl\"\n",
        )
        .unwrap();

        let (config, path) = apply_project_config(Config::default(), tmp.path());
        let project_dir = fs::canonicalize(tmp.path()).unwrap();
        assert_eq!(config.templates_path(), project_dir.join("tpl"));
        assert_eq!(path, Some(project_dir.join(PROJECT_CONFIG_NAME)));
    }

    #[test]
    fn test_project_templates_resolve_from_subfolder() {
        let tmp = TempDir::new().unwrap();
        let chapter = tmp.path().join("chapters");
        fs::create_dir(&chapter).unwrap();
        fs::create_dir(tmp.path().join("tpl")).unwrap();
        fs::write(
            tmp.path().join(PROJECT_CONFIG_NAME),
            "[templates]\ntemplates = \"./tpl\"\n",
        )
        .unwrap();

        let (config, _) = apply_project_config(Config::default(), &chapter);
        assert_eq!(
            crate::validators::classify_template_path(&config.templates_path()),
            crate::validators::TemplatePathKind::Directory
        );
    }

    #[test]
    fn test_project_templates_absolute_and_home_kept() {
        let project_dir = Path::new("/work/thesis");
        assert_eq!(anchor_to(project_dir, "/opt/tpl"), "/opt/tpl");
        assert_eq!(anchor_to(project_dir, "~/tpl"), "~/tpl");
        assert_eq!(
            PathBuf::from(anchor_to(project_dir, "tpl")),
            PathBuf::from("/work/thesis/tpl")
        );
    }

    #[test]
    fn test_apply_project_config_invalid_keeps_global() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PROJECT_CONFIG_NAME), "[figures\n").unwrap();

        let global = Config::default();
        let (config, _) = apply_project_config(global.clone(), tmp.path());
        assert_eq!(config.templates.templates, global.templates.templates);
    }

    #[test]
    fn test_load_or_create_config_creates_then_loads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let (_, status) = load_or_create_config(&path);
        assert!(matches!(status, ConfigLoadStatus::Created));
        assert!(path.is_file());

        let (config, status) = load_or_create_config(&path);
        assert!(matches!(status, ConfigLoadStatus::Loaded));
        assert_eq!(config.editor.command, "inkscape");
    }

    #[test]
    fn test_load_status_describe() {
        assert_eq!(ConfigLoadStatus::Loaded.describe(), "loaded");
        assert_eq!(
            ConfigLoadStatus::Error("Malformed TOML".to_string()).describe(),
            "using defaults: Malformed TOML"
        );
    }

    #[test]
    fn test_load_or_create_config_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        let (_, status) = load_or_create_config(&path);
        assert!(matches!(status, ConfigLoadStatus::Error(_)));
    }
}
