//! Column-oriented chart specifications for the external charting consumer.
//!
//! Aggregates are projected into [`ChartSpec`] values: a small table of named
//! columns plus encoding hints (which column is x, which is y, the chart
//! kind). Nothing here renders anything; the consumer decides how to draw.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::aggregate::{
    CancellationReason, CaseTimeline, DailyCancellationPoint, DurationHeatmap, LoadDurationPoint,
    LoadRatingPoint, NormsComparisonRow,
};

// ── Spec model ────────────────────────────────────────────────────────────────

/// How the consumer should draw the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Heatmap,
    Scatter,
    Timeline,
}

/// Bar direction hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// One cell of a chart column.
///
/// Serializes untagged, so consumers see plain JSON scalars: strings,
/// numbers, ISO dates, and `null` for empty cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartValue {
    Text(String),
    Integer(u64),
    Number(f64),
    Date(NaiveDate),
    Time(NaiveDateTime),
    Empty,
}

impl From<&str> for ChartValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ChartValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for ChartValue {
    fn from(value: u64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for ChartValue {
    fn from(value: u32) -> Self {
        Self::Integer(u64::from(value))
    }
}

impl From<f64> for ChartValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Option<f64>> for ChartValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Empty, Self::Number)
    }
}

impl From<NaiveDate> for ChartValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for ChartValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Time(value)
    }
}

/// A named column; all columns of one spec have equal length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartColumn {
    pub name: String,
    pub values: Vec<ChartValue>,
}

impl ChartColumn {
    fn new(name: &str, values: Vec<ChartValue>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

/// A chart-ready table plus encoding hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    /// Name of the column mapped to the x axis.
    pub x: String,
    /// Name of the column mapped to the y axis.
    pub y: String,
    /// Optional column the consumer should encode as color.
    pub color: Option<String>,
    pub orientation: Orientation,
    pub columns: Vec<ChartColumn>,
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Line chart of the gap-free daily cancellation series.
pub fn daily_cancellations_chart(series: &[DailyCancellationPoint]) -> ChartSpec {
    ChartSpec {
        title: "Canceled orders per day".to_string(),
        kind: ChartKind::Line,
        x: "date".to_string(),
        y: "canceled_cases".to_string(),
        color: None,
        orientation: Orientation::Vertical,
        columns: vec![
            ChartColumn::new("date", series.iter().map(|p| p.date.into()).collect()),
            ChartColumn::new(
                "canceled_cases",
                series.iter().map(|p| p.canceled_cases.into()).collect(),
            ),
        ],
    }
}

/// Heatmap of mean duration in long form: one row per (label, hour) cell,
/// including the empty ones, so the consumer can reconstruct the full grid.
pub fn duration_heatmap_chart(heatmap: &DurationHeatmap) -> ChartSpec {
    let mut labels = Vec::new();
    let mut hours = Vec::new();
    let mut means = Vec::new();
    for row in &heatmap.rows {
        for (hour, cell) in heatmap.hours.iter().zip(&row.cells) {
            labels.push(ChartValue::Text(row.label.clone()));
            hours.push(ChartValue::from(*hour));
            means.push(ChartValue::from(*cell));
        }
    }

    let label_column = heatmap.dimension.as_str();
    ChartSpec {
        title: "Mean stage duration by hour".to_string(),
        kind: ChartKind::Heatmap,
        x: "hour".to_string(),
        y: label_column.to_string(),
        color: Some("mean_minutes".to_string()),
        orientation: Orientation::Vertical,
        columns: vec![
            ChartColumn::new(label_column, labels),
            ChartColumn::new("hour", hours),
            ChartColumn::new("mean_minutes", means),
        ],
    }
}

/// Scatter of hourly load against mean total order duration.
pub fn load_vs_duration_chart(series: &[LoadDurationPoint]) -> ChartSpec {
    ChartSpec {
        title: "Order duration vs hourly load".to_string(),
        kind: ChartKind::Scatter,
        x: "avg_cases_started".to_string(),
        y: "avg_total_duration".to_string(),
        color: None,
        orientation: Orientation::Vertical,
        columns: vec![
            ChartColumn::new("hour", series.iter().map(|p| p.hour.into()).collect()),
            ChartColumn::new(
                "avg_cases_started",
                series.iter().map(|p| p.avg_cases_started.into()).collect(),
            ),
            ChartColumn::new(
                "avg_total_duration",
                series.iter().map(|p| p.avg_total_duration.into()).collect(),
            ),
        ],
    }
}

/// Scatter of hourly load against mean delivery rating.
pub fn load_vs_rating_chart(series: &[LoadRatingPoint]) -> ChartSpec {
    ChartSpec {
        title: "Delivery rating vs hourly load".to_string(),
        kind: ChartKind::Scatter,
        x: "avg_cases_started".to_string(),
        y: "avg_rating".to_string(),
        color: None,
        orientation: Orientation::Vertical,
        columns: vec![
            ChartColumn::new("hour", series.iter().map(|p| p.hour.into()).collect()),
            ChartColumn::new(
                "avg_cases_started",
                series.iter().map(|p| p.avg_cases_started.into()).collect(),
            ),
            ChartColumn::new(
                "avg_rating",
                series.iter().map(|p| p.avg_rating.into()).collect(),
            ),
        ],
    }
}

/// Grouped bars of actual vs normative stage duration in long form.
pub fn norms_comparison_chart(rows: &[NormsComparisonRow]) -> ChartSpec {
    let mut stages = Vec::new();
    let mut series = Vec::new();
    let mut minutes = Vec::new();
    for row in rows {
        stages.push(ChartValue::Text(row.stage.clone()));
        series.push(ChartValue::from("actual"));
        minutes.push(ChartValue::Number(row.actual_minutes));
        stages.push(ChartValue::Text(row.stage.clone()));
        series.push(ChartValue::from("expected"));
        minutes.push(ChartValue::Number(row.expected_minutes));
    }

    ChartSpec {
        title: "Actual vs normative stage duration".to_string(),
        kind: ChartKind::Bar,
        x: "stage".to_string(),
        y: "minutes".to_string(),
        color: Some("series".to_string()),
        orientation: Orientation::Vertical,
        columns: vec![
            ChartColumn::new("stage", stages),
            ChartColumn::new("series", series),
            ChartColumn::new("minutes", minutes),
        ],
    }
}

/// Horizontal bars of cancellation reason frequencies.
pub fn cancellation_reasons_chart(reasons: &[CancellationReason]) -> ChartSpec {
    ChartSpec {
        title: "Cancellation reasons by stage".to_string(),
        kind: ChartKind::Bar,
        x: "count".to_string(),
        y: "stage".to_string(),
        color: None,
        orientation: Orientation::Horizontal,
        columns: vec![
            ChartColumn::new(
                "stage",
                reasons.iter().map(|r| r.stage.as_str().into()).collect(),
            ),
            ChartColumn::new("count", reasons.iter().map(|r| r.count.into()).collect()),
        ],
    }
}

/// Timeline of one example case, one bar per event.
pub fn case_timeline_chart(timeline: &CaseTimeline) -> ChartSpec {
    ChartSpec {
        title: format!("Event timeline for order {}", timeline.case),
        kind: ChartKind::Timeline,
        x: "start_time".to_string(),
        y: "stage".to_string(),
        color: Some("stage".to_string()),
        orientation: Orientation::Horizontal,
        columns: vec![
            ChartColumn::new(
                "stage",
                timeline
                    .events
                    .iter()
                    .map(|e| e.stage.as_str().into())
                    .collect(),
            ),
            ChartColumn::new(
                "start_time",
                timeline.events.iter().map(|e| e.start_time.into()).collect(),
            ),
            ChartColumn::new(
                "end_time",
                timeline.events.iter().map(|e| e.end_time.into()).collect(),
            ),
        ],
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
