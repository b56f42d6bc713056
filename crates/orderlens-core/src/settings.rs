use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Order-processing analytics over delimited event logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "orderlens",
    about = "Order-processing analytics over delimited event logs",
    version
)]
pub struct Settings {
    /// Path to the event log (data/dataset.csv, then dataset.csv, when omitted)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Field delimiter of the input file
    #[arg(long, default_value = "tab", value_parser = ["tab", "comma"])]
    pub delimiter: String,

    /// Character encoding of the input file
    #[arg(long, default_value = "utf-8", value_parser = ["utf-8", "windows-1251"])]
    pub encoding: String,

    /// Start of the date range, day-first or ISO (defaults to the observed span)
    #[arg(long)]
    pub from: Option<String>,

    /// End of the date range, day-first or ISO (defaults to the observed span)
    #[arg(long)]
    pub to: Option<String>,

    /// Restrict the report to a single territory
    #[arg(long)]
    pub territory: Option<String>,

    /// Restrict the duration heatmap to a single stage label
    #[arg(long)]
    pub stage: Option<String>,

    /// Row dimension of the duration heatmap
    #[arg(long, default_value = "stage", value_parser = ["stage", "territory"])]
    pub heatmap_by: String,

    /// Which view(s) to emit
    #[arg(long, default_value = "all", value_parser = ["all", "projections", "resources", "details"])]
    pub view: String,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Seed for example-case selection
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// JSON file overriding the built-in normative durations
    #[arg(long)]
    pub norms: Option<PathBuf>,

    /// Substring marking cancellation stages
    #[arg(long, default_value = "Cancel")]
    pub cancel_marker: String,

    /// Substring marking delivery stages
    #[arg(long, default_value = "Deliver")]
    pub deliver_marker: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path (logs go to stderr when omitted)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved presentation preferences
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted presentation preferences saved to `~/.orderlens/last_used.json`.
///
/// Only presentation choices persist; filter parameters and the data path are
/// per-invocation by design.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatmap_by: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted preferences file,
    /// `~/.orderlens/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the preferences path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".orderlens").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path, creating parent
    /// directories if needed.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the default preferences file if it exists.
    pub fn clear() -> Result<(), std::io::Error> {
        Self::clear_at(&Self::config_path())
    }

    /// Delete the preferences file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge persisted presentation preferences where no
    /// explicit CLI value was provided, and persist the result for next time.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] but accepts an explicit
    /// argument list, enabling unit-testing without spawning subprocesses.
    pub fn load_with_last_used_from_args(args: Vec<std::ffi::OsString>) -> Self {
        Self::load_with_last_used_impl(args, &LastUsedParams::config_path())
    }

    /// Full implementation: accepts args and an explicit preferences path so
    /// that tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());

        // Parse into the typed struct using the same args.
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            // Apply the debug override and return without re-persisting.
            return Self::apply_debug_flag(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // Merge persisted values for fields that were NOT explicitly set on
        // the command line (CLI always wins). Filter parameters are never
        // loaded from the persisted file.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        // NOTE: clap stores the arg id using the *field name* (underscores),
        // not the long-flag spelling (hyphens).
        if !is_arg_explicitly_set(&matches, "heatmap_by") {
            if let Some(v) = last.heatmap_by {
                settings.heatmap_by = v;
            }
        }

        settings = Self::apply_debug_flag(settings);

        // Persist current presentation preferences for next run.
        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// `--debug` overrides whatever `--log-level` resolved to.
    fn apply_debug_flag(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            view: Some(s.view.clone()),
            format: Some(s.format.clone()),
            heatmap_by: Some(s.heatmap_by.clone()),
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
