use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Terminal classification of one order, derived per case (never per row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// The case's final event carries the cancellation marker.
    Canceled,
    /// The case's final event carries the delivery marker.
    Delivered,
    /// The case has not reached a terminal stage yet.
    InProgress,
}

impl OrderStatus {
    /// The canonical snake_case string identifier for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Canceled => "canceled",
            OrderStatus::Delivered => "delivered",
            OrderStatus::InProgress => "in_progress",
        }
    }
}

/// A single fully-annotated event: one (case, stage) occurrence from the log.
///
/// Source columns are kept verbatim; derived attributes are computed once
/// during normalization and never re-derived downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Identifier of the order this event belongs to.
    pub case: String,
    /// Label naming the processing step (free-text category).
    pub stage: String,
    /// Naive local timestamp at which the stage started.
    pub start_time: NaiveDateTime,
    /// Naive local timestamp at which the stage ended.
    pub end_time: NaiveDateTime,
    /// Geographic/operational partition the event belongs to.
    pub territory: String,
    /// Optional numeric score attached to delivery-terminal events.
    pub delivery_rating: Option<f64>,
    /// Stage duration in minutes, clamped to 0 when `end_time <= start_time`.
    pub duration_minutes: f64,
    /// Calendar date extracted from `start_time`.
    pub date: NaiveDate,
    /// Hour of day (0-23) extracted from `start_time`.
    pub hour: u32,
    /// Whether `stage` carries the cancellation marker.
    pub is_canceled: bool,
    /// Status shared by every row of this event's case.
    pub order_status: OrderStatus,
}

/// The normalized event table: immutable once built by ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    /// Annotated rows in original input order.
    pub rows: Vec<EventRecord>,
}

impl EventTable {
    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct cases in the table.
    pub fn case_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.case.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Sorted distinct territory labels (filter-widget inventory).
    pub fn territories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.territory.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Sorted distinct stage labels (filter-widget inventory).
    pub fn stages(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.stage.as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Earliest and latest observed `date`, or `None` for an empty table.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.first()?;
        let mut min = first.date;
        let mut max = first.date;
        for row in &self.rows {
            if row.date < min {
                min = row.date;
            }
            if row.date > max {
                max = row.date;
            }
        }
        Some((min, max))
    }
}

/// Counters describing one ingestion pass over a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Data rows read from the file (header excluded).
    pub rows_read: u64,
    /// Rows that survived normalization and entered the table.
    pub rows_kept: u64,
    /// Rows dropped because a timestamp failed to parse.
    pub rows_dropped_bad_timestamp: u64,
    /// Non-empty rating values that failed numeric coercion (made absent).
    pub ratings_coerced: u64,
}
