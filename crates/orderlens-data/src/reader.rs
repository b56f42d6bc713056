//! Delimited event-log ingestion and normalization for OrderLens.
//!
//! Decodes a delimited text file (tab or comma, UTF-8 or windows-1251) and
//! builds the fully-annotated [`EventTable`]: typed timestamps, derived
//! duration / date / hour columns, cancellation flags, and the per-case
//! order status.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use chrono::Timelike;
use orderlens_core::error::{LensError, Result};
use orderlens_core::markers::MarkerRules;
use orderlens_core::models::{EventRecord, EventTable, LoadStats, OrderStatus};
use orderlens_core::time_utils;
use tracing::{debug, warn};

// ── Loader configuration ──────────────────────────────────────────────────────

/// Character encoding of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Standard UTF-8 (the primary log variant).
    Utf8,
    /// The legacy windows-1251 code page.
    Windows1251,
}

impl SourceEncoding {
    /// Map a CLI label to an encoding.
    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "utf-8" => Ok(SourceEncoding::Utf8),
            "windows-1251" => Ok(SourceEncoding::Windows1251),
            other => Err(LensError::Config(format!(
                "unknown encoding label: {}",
                other
            ))),
        }
    }
}

/// How to read the source file: field delimiter plus character encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Field delimiter byte (tab in the primary variant, comma in the legacy
    /// one).
    pub delimiter: u8,
    /// Character encoding of the file bytes.
    pub encoding: SourceEncoding,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            encoding: SourceEncoding::Utf8,
        }
    }
}

impl LoaderConfig {
    /// Build a config from the CLI labels (`tab`/`comma`, `utf-8`/
    /// `windows-1251`).
    pub fn from_labels(delimiter: &str, encoding: &str) -> Result<Self> {
        let delimiter = match delimiter {
            "tab" => b'\t',
            "comma" => b',',
            other => {
                return Err(LensError::Config(format!(
                    "unknown delimiter label: {}",
                    other
                )))
            }
        };
        Ok(Self {
            delimiter,
            encoding: SourceEncoding::from_label(encoding)?,
        })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and normalize an event log into an [`EventTable`].
///
/// The file must carry a header naming the required columns `case`, `stage`,
/// `start_time`, `end_time`, `territory`; the `delivery_rating` column is
/// optional. A wrong schema or a wrong delimiter both surface as
/// [`LensError::MissingColumn`].
///
/// Normalization steps, in order:
/// 1. Decode the bytes with the configured encoding and parse records with
///    the configured delimiter.
/// 2. Parse both timestamps day-first; rows where either fails are dropped
///    and counted, never kept with null timestamps.
/// 3. Coerce `delivery_rating` to numeric, mapping failures to absent.
/// 4. Derive `duration_minutes` (clamped at zero), `date`, `hour`, and the
///    `is_canceled` flag.
/// 5. Classify each case's terminal event (maximum `end_time`, first
///    occurrence on ties) and broadcast the resulting status to every row of
///    the case.
///
/// Returns the table together with the [`LoadStats`] counters for the pass.
pub fn load_event_table(
    path: &Path,
    config: &LoaderConfig,
    rules: &MarkerRules,
) -> Result<(EventTable, LoadStats)> {
    let bytes = std::fs::read(path).map_err(|source| LensError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode(&bytes, config.encoding, path);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut stats = LoadStats::default();
    let mut rows: Vec<EventRecord> = Vec::new();

    for record in reader.records() {
        let record = record?;
        stats.rows_read += 1;

        let raw_start = field(&record, columns.start_time);
        let raw_end = field(&record, columns.end_time);
        let (start_time, end_time) = match (
            time_utils::parse_timestamp(raw_start),
            time_utils::parse_timestamp(raw_end),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                stats.rows_dropped_bad_timestamp += 1;
                debug!(
                    "Row {}: unparseable timestamp (\"{}\" / \"{}\"), dropped",
                    stats.rows_read, raw_start, raw_end
                );
                continue;
            }
        };

        let delivery_rating = match columns.rating {
            Some(idx) => parse_rating(field(&record, idx), &mut stats),
            None => None,
        };

        let stage = field(&record, columns.stage).to_string();
        let is_canceled = rules.is_cancellation(&stage);

        rows.push(EventRecord {
            case: field(&record, columns.case).to_string(),
            territory: field(&record, columns.territory).to_string(),
            duration_minutes: time_utils::duration_minutes(start_time, end_time),
            date: start_time.date(),
            hour: start_time.hour(),
            is_canceled,
            // Placeholder until the per-case broadcast below.
            order_status: OrderStatus::InProgress,
            stage,
            start_time,
            end_time,
            delivery_rating,
        });
    }

    apply_order_status(&mut rows, rules);
    stats.rows_kept = rows.len() as u64;

    debug!(
        "File {}: {} rows read, {} kept, {} dropped (bad timestamp), {} ratings coerced",
        path.display(),
        stats.rows_read,
        stats.rows_kept,
        stats.rows_dropped_bad_timestamp,
        stats.ratings_coerced,
    );

    Ok((EventTable { rows }, stats))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Header positions of the required and optional columns.
struct ColumnIndex {
    case: usize,
    stage: usize,
    start_time: usize,
    end_time: usize,
    territory: usize,
    rating: Option<usize>,
}

impl ColumnIndex {
    /// Resolve column positions from the header row. A wrong delimiter
    /// collapses the header into one field, so it surfaces here too.
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let position = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LensError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            case: position("case")?,
            stage: position("stage")?,
            start_time: position("start_time")?,
            end_time: position("end_time")?,
            territory: position("territory")?,
            rating: headers.iter().position(|h| h == "delivery_rating"),
        })
    }
}

/// Fetch a field by position, tolerating short records.
fn field<'a>(record: &'a csv::StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("")
}

/// Decode raw file bytes with the configured encoding.
///
/// Decoding is lossy: malformed sequences are replaced, not fatal, and only
/// warrant a warning.
fn decode(bytes: &[u8], encoding: SourceEncoding, path: &Path) -> String {
    match encoding {
        SourceEncoding::Utf8 => {
            let text = String::from_utf8_lossy(bytes);
            if matches!(text, Cow::Owned(_)) {
                warn!(
                    "File {} contains invalid UTF-8; malformed sequences replaced",
                    path.display()
                );
            }
            text.into_owned()
        }
        SourceEncoding::Windows1251 => {
            let (text, _, had_errors) = encoding_rs::WINDOWS_1251.decode(bytes);
            if had_errors {
                warn!(
                    "File {} contains bytes invalid for windows-1251; replaced",
                    path.display()
                );
            }
            text.into_owned()
        }
    }
}

/// Coerce a raw rating value to numeric. Empty values are simply absent;
/// non-empty values that fail to parse are counted as coerced.
fn parse_rating(raw: &str, stats: &mut LoadStats) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            stats.ratings_coerced += 1;
            None
        }
    }
}

/// Pick each case's terminal event (maximum `end_time`, first occurrence
/// wins on ties), classify its stage, and broadcast the status to every row
/// of the case.
fn apply_order_status(rows: &mut [EventRecord], rules: &MarkerRules) {
    use std::collections::hash_map::Entry;

    let mut terminal: HashMap<String, usize> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        match terminal.entry(row.case.clone()) {
            Entry::Occupied(mut e) => {
                // Strictly greater keeps the first occurrence on ties.
                if rows[*e.get()].end_time < row.end_time {
                    e.insert(idx);
                }
            }
            Entry::Vacant(e) => {
                e.insert(idx);
            }
        }
    }

    let status_by_case: HashMap<String, OrderStatus> = terminal
        .into_iter()
        .map(|(case, idx)| {
            let status = rules.classify(&rows[idx].stage);
            (case, status)
        })
        .collect();

    for row in rows.iter_mut() {
        if let Some(status) = status_by_case.get(&row.case) {
            row.order_status = *status;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
