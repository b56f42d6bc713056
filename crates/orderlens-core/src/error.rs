use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the OrderLens crates.
#[derive(Error, Debug)]
pub enum LensError {
    /// The event-log file could not be opened or read from disk.
    #[error("Failed to read data file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The event-log header is missing a required column.
    #[error("Missing required column \"{0}\" in header")]
    MissingColumn(String),

    /// A record could not be decoded by the CSV parser.
    #[error("Failed to parse delimited data: {0}")]
    Csv(#[from] csv::Error),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A JSON document (norms override, persisted params) could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the OrderLens crates.
pub type Result<T> = std::result::Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = LensError::FileRead {
            path: PathBuf::from("/some/dataset.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read data file"));
        assert!(msg.contains("/some/dataset.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = LensError::MissingColumn("start_time".to_string());
        let msg = err.to_string();
        assert_eq!(msg, "Missing required column \"start_time\" in header");
    }

    #[test]
    fn test_error_display_timestamp_parse() {
        let err = LensError::TimestampParse("not-a-timestamp".to_string());
        let msg = err.to_string();
        assert_eq!(msg, "Invalid timestamp format: not-a-timestamp");
    }

    #[test]
    fn test_error_display_config() {
        let err = LensError::Config("unknown delimiter label".to_string());
        let msg = err.to_string();
        assert_eq!(msg, "Configuration error: unknown delimiter label");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: LensError = io_err.into();
        let msg = err.to_string();
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: LensError = json_err.into();
        let msg = err.to_string();
        assert!(msg.contains("Failed to parse JSON"));
    }

    #[test]
    fn test_error_from_csv() {
        // A ragged record under the default strict reader yields a CSV error.
        let csv_err = csv::Reader::from_reader("a,b\n1,2,3".as_bytes())
            .records()
            .next()
            .expect("one record")
            .unwrap_err();
        let err: LensError = csv_err.into();
        let msg = err.to_string();
        assert!(msg.contains("Failed to parse delimited data"));
    }
}
