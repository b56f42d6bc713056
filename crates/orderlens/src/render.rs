//! Plain-text rendering of an assembled report.
//!
//! Tables are aligned with widths computed from the data, and every number
//! goes through the shared formatting helpers so the text output and the logs
//! agree on presentation. JSON output bypasses this module entirely.

use std::fmt::Write as _;

use orderlens_core::formatting::{format_minutes, format_number, percentage};
use orderlens_core::time_utils::{format_date, format_timestamp};
use orderlens_data::aggregate::{
    CancellationReason, CaseTimeline, DailyCancellationPoint, DurationHeatmap, LoadDurationPoint,
    LoadRatingPoint, NormsComparisonRow,
};
use orderlens_data::report::{DashboardReport, DetailsView, ProjectionsView, ResourcesView};

/// Render the full report as plain text.
pub fn render_text(report: &DashboardReport) -> String {
    let mut out = String::new();

    render_header(&mut out, report);

    if report.summary.row_count == 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "No rows matched the current filters.");
    } else {
        if let Some(view) = &report.projections {
            render_projections(&mut out, view);
        }
        if let Some(view) = &report.resources {
            render_resources(&mut out, view);
        }
        if let Some(view) = &report.details {
            render_details(&mut out, view);
        }
    }

    render_footer(&mut out, report);
    out
}

// ── Header and footer ─────────────────────────────────────────────────────────

fn render_header(out: &mut String, report: &DashboardReport) {
    let summary = &report.summary;
    let _ = writeln!(out, "OrderLens report");
    let _ = writeln!(out, "================");
    let _ = writeln!(out);
    let _ = writeln!(out, "Rows:        {}", format_number(summary.row_count as f64, 0));
    let _ = writeln!(out, "Orders:      {}", format_number(summary.case_count as f64, 0));
    let _ = writeln!(
        out,
        "Territory:   {}",
        summary.territory.as_deref().unwrap_or("all")
    );
    if !report.dimensions.territories.is_empty() {
        let _ = writeln!(
            out,
            "Territories: {}",
            report.dimensions.territories.join(", ")
        );
    }
    match (summary.start_date, summary.end_date) {
        (Some(start), Some(end)) => {
            let _ = writeln!(
                out,
                "Date range:  {} to {}",
                format_date(start),
                format_date(end)
            );
        }
        _ => {
            let _ = writeln!(out, "Date range:  (no data)");
        }
    }
}

fn render_footer(out: &mut String, report: &DashboardReport) {
    let stats = &report.metadata.load_stats;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated {} | {} rows read, {} kept, {} dropped | load {:.2}s, aggregate {:.2}s",
        report.metadata.generated_at,
        format_number(stats.rows_read as f64, 0),
        format_number(stats.rows_kept as f64, 0),
        format_number(stats.rows_dropped_bad_timestamp as f64, 0),
        report.metadata.load_time_seconds,
        report.metadata.aggregate_time_seconds
    );
}

// ── Projections ───────────────────────────────────────────────────────────────

fn render_projections(out: &mut String, view: &ProjectionsView) {
    let _ = writeln!(out);
    let _ = writeln!(out, "Projections");
    let _ = writeln!(out, "-----------");
    let _ = writeln!(
        out,
        "Canceled orders: {}",
        format_number(view.canceled_case_count as f64, 0)
    );
    if view.canceled.is_empty() {
        return;
    }

    let _ = writeln!(out);
    let case_width = column_width("Order", view.canceled.iter().map(|o| o.case.as_str()));
    let stage_width = column_width(
        "Cancellation stage",
        view.canceled.iter().map(|o| o.stage.as_str()),
    );
    let _ = writeln!(
        out,
        "{:<case_width$}  {:<stage_width$}  Canceled at",
        "Order", "Cancellation stage"
    );
    for order in &view.canceled {
        let _ = writeln!(
            out,
            "{:<case_width$}  {:<stage_width$}  {}",
            order.case,
            order.stage,
            format_timestamp(order.start_time)
        );
    }
}

// ── Resources ─────────────────────────────────────────────────────────────────

fn render_resources(out: &mut String, view: &ResourcesView) {
    let _ = writeln!(out);
    let _ = writeln!(out, "Resources");
    let _ = writeln!(out, "---------");

    render_heatmap(out, &view.heatmap);
    render_timeline(out, view.example_timeline.as_ref());
    render_rating_scatter(out, &view.load_vs_rating);
    render_duration_scatter(out, &view.load_vs_duration);
}

fn render_heatmap(out: &mut String, heatmap: &DurationHeatmap) {
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Mean duration by {} and hour (minutes)",
        heatmap.dimension.as_str()
    );
    if heatmap.rows.is_empty() {
        let _ = writeln!(out, "  (no non-canceled rows in range)");
        return;
    }

    let label_width = column_width(
        heatmap.dimension.as_str(),
        heatmap.rows.iter().map(|r| r.label.as_str()),
    );
    let mut header = format!("{:<label_width$}", heatmap.dimension.as_str());
    for hour in &heatmap.hours {
        let _ = write!(header, " {:>7}", format!("{:02}h", hour));
    }
    let _ = writeln!(out, "{}", header);

    for row in &heatmap.rows {
        let mut line = format!("{:<label_width$}", row.label);
        for cell in &row.cells {
            match cell {
                Some(mean) => {
                    let _ = write!(line, " {:>7}", format_number(*mean, 1));
                }
                None => {
                    let _ = write!(line, " {:>7}", "-");
                }
            }
        }
        let _ = writeln!(out, "{}", line);
    }
}

fn render_timeline(out: &mut String, timeline: Option<&CaseTimeline>) {
    let _ = writeln!(out);
    let timeline = match timeline {
        Some(timeline) => timeline,
        None => {
            let _ = writeln!(out, "Example order timeline: no orders to show.");
            return;
        }
    };

    let status = if timeline.canceled {
        "canceled"
    } else {
        "completed or in progress"
    };
    let _ = writeln!(out, "Example order {} ({})", timeline.case, status);

    let stage_width = column_width("Stage", timeline.events.iter().map(|e| e.stage.as_str()));
    let _ = writeln!(
        out,
        "{:<stage_width$}  {:<16}  {:<16}  Territory",
        "Stage", "Start", "End"
    );
    for event in &timeline.events {
        let _ = writeln!(
            out,
            "{:<stage_width$}  {:<16}  {:<16}  {}",
            event.stage,
            format_timestamp(event.start_time),
            format_timestamp(event.end_time),
            event.territory
        );
    }
}

fn render_rating_scatter(out: &mut String, series: &[LoadRatingPoint]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "Delivery rating vs hourly load");
    if series.is_empty() {
        let _ = writeln!(out, "  (no rated delivered orders in range)");
        return;
    }

    let _ = writeln!(out, "{:>4}  {:>11}  {:>10}", "Hour", "Avg started", "Avg rating");
    for point in series {
        let _ = writeln!(
            out,
            "{:>4}  {:>11}  {:>10}",
            format!("{:02}", point.hour),
            format_number(point.avg_cases_started, 2),
            format_number(point.avg_rating, 2)
        );
    }
}

fn render_duration_scatter(out: &mut String, series: &[LoadDurationPoint]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "Total order duration vs hourly load");
    if series.is_empty() {
        let _ = writeln!(out, "  (no non-canceled orders in range)");
        return;
    }

    let _ = writeln!(out, "{:>4}  {:>11}  {:>12}", "Hour", "Avg started", "Avg duration");
    for point in series {
        let _ = writeln!(
            out,
            "{:>4}  {:>11}  {:>12}",
            format!("{:02}", point.hour),
            format_number(point.avg_cases_started, 2),
            format_minutes(point.avg_total_duration)
        );
    }
}

// ── Details ───────────────────────────────────────────────────────────────────

fn render_details(out: &mut String, view: &DetailsView) {
    let _ = writeln!(out);
    let _ = writeln!(out, "Details");
    let _ = writeln!(out, "-------");

    render_daily_cancellations(out, &view.daily_cancellations);
    render_norms(out, &view.norms);
    render_reasons(out, &view.cancellation_reasons);
}

fn render_daily_cancellations(out: &mut String, series: &[DailyCancellationPoint]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "Canceled orders per day");
    let _ = writeln!(out, "{:<10}  Canceled", "Date");
    for point in series {
        let _ = writeln!(out, "{:<10}  {}", format_date(point.date), point.canceled_cases);
    }
}

fn render_norms(out: &mut String, rows: &[NormsComparisonRow]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "Actual vs normative stage duration");
    if rows.is_empty() {
        let _ = writeln!(out, "  (no normative durations configured)");
        return;
    }

    let stage_width = column_width("Stage", rows.iter().map(|r| r.stage.as_str()));
    let _ = writeln!(out, "{:<stage_width$}  {:>8}  {:>8}", "Stage", "Actual", "Norm");
    for row in rows {
        let actual = if row.present_in_data {
            format_minutes(row.actual_minutes)
        } else {
            "-".to_string()
        };
        let note = if row.present_in_data { "" } else { "  (not in data)" };
        let _ = writeln!(
            out,
            "{:<stage_width$}  {:>8}  {:>8}{}",
            row.stage,
            actual,
            format_minutes(row.expected_minutes),
            note
        );
    }
}

fn render_reasons(out: &mut String, reasons: &[CancellationReason]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "Cancellation reasons");
    if reasons.is_empty() {
        let _ = writeln!(out, "  (no cancellations in range)");
        return;
    }

    let total: u64 = reasons.iter().map(|r| r.count).sum();
    let stage_width = column_width("Stage", reasons.iter().map(|r| r.stage.as_str()));
    let _ = writeln!(out, "{:<stage_width$}  {:>5}  {:>6}", "Stage", "Count", "Share");
    for reason in reasons {
        let share = percentage(reason.count as f64, total as f64, 1);
        let _ = writeln!(
            out,
            "{:<stage_width$}  {:>5}  {:>5}%",
            reason.stage,
            reason.count,
            format_number(share, 1)
        );
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Width of a left-aligned column: the widest of the header and the values.
///
/// Counts characters rather than bytes so the width agrees with how `format!`
/// pads non-ASCII labels.
fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|v| v.chars().count())
        .fold(header.chars().count(), usize::max)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
