use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the standard `~/.orderlens/` directory hierarchy exists.
///
/// Creates the following directories if absent (including any missing parents):
/// - `~/.orderlens/`
/// - `~/.orderlens/logs/`
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

/// Create the hierarchy under an explicit base directory.
pub fn ensure_directories_in(base_dir: &Path) -> anyhow::Result<()> {
    let lens_dir = base_dir.join(".orderlens");
    std::fs::create_dir_all(&lens_dir)?;
    std::fs::create_dir_all(lens_dir.join("logs"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive.
/// Falls back to `"info"` if the level string is not recognised.
///
/// When `log_file` is given, events are additionally appended there with ANSI
/// colors disabled; stderr output is unaffected.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    // Map the CLI level names onto tracing directives (tracing uses lowercase).
    let upper = log_level.to_uppercase();
    let normalised = match upper.as_str() {
        "DEBUG" | "CRITICAL" => "debug",
        "INFO" => "info",
        "WARNING" => "warn",
        "ERROR" => "error",
        other => other,
    };

    let filter = EnvFilter::try_new(normalised).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer().with_target(false).with_thread_ids(false);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let file_layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(std::sync::Arc::new(file));

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
        }
    }

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Attempt to locate the event log when `--data` is not supplied.
///
/// Checks the following paths relative to the working directory and returns
/// the first that exists:
/// 1. `data/dataset.csv`
/// 2. `dataset.csv`
///
/// Returns `None` when neither file exists.
pub fn discover_data_path() -> Option<PathBuf> {
    discover_data_path_in(Path::new("."))
}

/// Probe the default candidates under an explicit base directory.
pub fn discover_data_path_in(base_dir: &Path) -> Option<PathBuf> {
    let candidates = [
        base_dir.join("data").join("dataset.csv"),
        base_dir.join("dataset.csv"),
    ];
    candidates.into_iter().find(|p| p.exists())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── test_ensure_directories ───────────────────────────────────────────────

    #[test]
    fn test_ensure_directories_creates_hierarchy() {
        let tmp = TempDir::new().expect("tempdir");

        ensure_directories_in(tmp.path()).expect("ensure_directories_in should succeed");

        let lens_dir = tmp.path().join(".orderlens");
        assert!(lens_dir.is_dir(), ".orderlens dir must exist");
        assert!(lens_dir.join("logs").is_dir(), "logs subdir must exist");
    }

    #[test]
    fn test_ensure_directories_is_idempotent() {
        let tmp = TempDir::new().expect("tempdir");

        ensure_directories_in(tmp.path()).expect("first run");
        ensure_directories_in(tmp.path()).expect("second run must not fail");
    }

    // ── test_discover_data_path ───────────────────────────────────────────────

    #[test]
    fn test_discover_data_path_returns_none_when_absent() {
        let tmp = TempDir::new().expect("tempdir");

        let path = discover_data_path_in(tmp.path());

        assert!(
            path.is_none(),
            "should return None when neither candidate exists"
        );
    }

    #[test]
    fn test_discover_data_path_prefers_data_subdirectory() {
        let tmp = TempDir::new().expect("tempdir");
        let data_dir = tmp.path().join("data");
        std::fs::create_dir_all(&data_dir).expect("create data dir");
        std::fs::write(data_dir.join("dataset.csv"), "case\torder-1\n").expect("write nested");
        std::fs::write(tmp.path().join("dataset.csv"), "case\torder-2\n").expect("write root");

        let path = discover_data_path_in(tmp.path());

        assert_eq!(path, Some(data_dir.join("dataset.csv")));
    }

    #[test]
    fn test_discover_data_path_falls_back_to_working_directory_file() {
        let tmp = TempDir::new().expect("tempdir");
        // Only the bare file exists (no data/ subdirectory).
        std::fs::write(tmp.path().join("dataset.csv"), "case\torder-1\n").expect("write root");

        let path = discover_data_path_in(tmp.path());

        assert_eq!(path, Some(tmp.path().join("dataset.csv")));
    }
}
