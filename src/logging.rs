//! Logging infrastructure for autoink.
//!
//! Structured file logging with daily rotation to platform-standard
//! directories. Nothing is logged to the terminal, which belongs to the
//! picker and the LaTeX output.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use directories::ProjectDirs;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;

/// Log files older than this are removed at startup.
const RETENTION_DAYS: u64 = 7;

/// Prefix of the rolling log files.
const LOG_FILE_PREFIX: &str = "autoink";

/// Handle returned by [`init`].
pub struct LoggingContext {
    /// Flushes the background writer when dropped.
    pub _guard: WorkerGuard,
    pub session_id: String,
    pub log_directory: PathBuf,
}

/// Why file logging could not be set up.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("no log directory for this platform")]
    NoLogDirectory,
    #[error("cannot create log directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("log subscriber already installed: {0}")]
    Subscriber(String),
}

/// Six hex characters tagging every line of one run.
fn new_session_id() -> String {
    use rand::Rng;
    let tag: [u8; 3] = rand::rng().random();
    tag.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Platform log directory.
///
/// macOS: ~/Library/Logs/autoink/
/// Linux: ~/.local/state/autoink/
/// Windows: %LocalAppData%\autoink\data\
fn log_dir() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        return dirs::home_dir().map(|home| home.join("Library").join("Logs").join("autoink"));
    }
    let project_dirs = ProjectDirs::from("com", "autoink", "autoink")?;
    Some(
        project_dirs
            .state_dir()
            .unwrap_or_else(|| project_dirs.data_local_dir())
            .to_path_buf(),
    )
}

/// Install the file subscriber.
///
/// `level` is the configured filter, used when `AUTOINK_LOG` is unset.
/// Keep the returned context alive until exit so buffered lines are written.
pub fn init(level: &str) -> Result<LoggingContext, LoggingError> {
    let session_id = new_session_id();

    let log_dir = log_dir().ok_or(LoggingError::NoLogDirectory)?;
    fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.clone(),
        source,
    })?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));

    let env_filter = EnvFilter::try_from_env("AUTOINK_LOG")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| LoggingError::Subscriber(e.to_string()))?;

    info!(session_id = %session_id, level = %level, "session_start");

    Ok(LoggingContext {
        _guard: guard,
        session_id,
        log_directory: log_dir,
    })
}

/// Whether `name` is one of our rotated log files (not the bare prefix).
fn is_rotated_log(name: &str) -> bool {
    name.strip_prefix(LOG_FILE_PREFIX)
        .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1)
}

/// Deletes rotated log files older than the retention period.
///
/// Errors are logged at WARN level and never abort the run.
pub fn cleanup_old_logs(log_dir: &Path) {
    cleanup_logs_older_than(
        log_dir,
        Duration::from_secs(RETENTION_DAYS * 24 * 60 * 60),
        SystemTime::now(),
    );
}

fn cleanup_logs_older_than(log_dir: &Path, retention: Duration, now: SystemTime) -> u32 {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %log_dir.display(), error = %e, "log_cleanup_read_failed");
            return 0;
        }
    };

    let mut removed = 0u32;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if is_rotated_log(name) => name.to_string(),
            _ => continue,
        };

        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %file_name, error = %e, "log_age_unknown");
                continue;
            }
        };

        // Files from the future are left alone
        let Ok(age) = now.duration_since(modified) else {
            continue;
        };

        if age <= retention {
            continue;
        }
        if let Err(e) = fs::remove_file(&path) {
            warn!(file = %file_name, error = %e, "log_remove_failed");
        } else {
            debug!(file = %file_name, age_days = age.as_secs() / 86400, "log_removed");
            removed += 1;
        }
    }

    if removed > 0 {
        debug!(count = removed, "log_cleanup_done");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_id_is_six_hex_chars() {
        let id = new_session_id();
        assert_eq!(id.len(), 6);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_is_rotated_log() {
        assert!(is_rotated_log("autoink.2026-10-01"));
        assert!(!is_rotated_log("autoink"));
        assert!(!is_rotated_log("autoink."));
        assert!(!is_rotated_log("autoinkish.2026-10-01"));
        assert!(!is_rotated_log("other.2026-10-01"));
    }

    #[test]
    fn test_cleanup_removes_only_old_logs() {
        let tmp = TempDir::new().unwrap();
        let old = tmp.path().join("autoink.2026-01-01");
        let fresh = tmp.path().join("autoink.2026-10-15");
        let unrelated = tmp.path().join("notes.txt");
        for path in [&old, &fresh, &unrelated] {
            fs::write(path, "log").unwrap();
        }

        // Pretend "now" is 30 days in the future: everything is old, but only
        // rotated logs are eligible.
        let now = SystemTime::now() + Duration::from_secs(30 * 86400);
        fs::File::options()
            .write(true)
            .open(&fresh)
            .unwrap()
            .set_modified(now)
            .unwrap();

        let deleted = cleanup_logs_older_than(tmp.path(), Duration::from_secs(7 * 86400), now);

        assert_eq!(deleted, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(unrelated.exists());
    }
}
