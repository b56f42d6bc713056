//! Report assembly: one full analysis pass over (table, filters, parameters).
//!
//! The report is the hand-off surface of the crate. Text and JSON renderers
//! consume it without touching the table again, and [`DashboardReport::chart_specs`]
//! projects every carried aggregate into the column-oriented chart form.

use std::time::Instant;

use chrono::{Local, NaiveDate};
use orderlens_core::models::{EventTable, LoadStats};
use orderlens_core::norms::NormativeDurations;
use orderlens_core::time_utils::format_timestamp;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{
    self, CancellationReason, CanceledOrder, CaseTimeline, DailyCancellationPoint,
    DurationHeatmap, HeatmapDimension, LoadDurationPoint, LoadRatingPoint, NormsComparisonRow,
};
use crate::chart::{self, ChartSpec};
use crate::filter::{filter_rows, FilterParams};

// ── Parameters ────────────────────────────────────────────────────────────────

/// Which views to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportView {
    All,
    Projections,
    Resources,
    Details,
}

impl ReportView {
    /// Parse a CLI label. Unknown labels fall back to `All`.
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "projections" => Self::Projections,
            "resources" => Self::Resources,
            "details" => Self::Details,
            _ => Self::All,
        }
    }

    fn includes_projections(self) -> bool {
        matches!(self, Self::All | Self::Projections)
    }

    fn includes_resources(self) -> bool {
        matches!(self, Self::All | Self::Resources)
    }

    fn includes_details(self) -> bool {
        matches!(self, Self::All | Self::Details)
    }
}

/// Everything one report pass needs beyond the table itself.
#[derive(Debug, Clone)]
pub struct ReportParams {
    pub filter: FilterParams,
    pub view: ReportView,
    pub heatmap_by: HeatmapDimension,
    /// Restrict the heatmap to one stage label.
    pub heatmap_stage: Option<String>,
    /// Seed for example-case selection.
    pub seed: u64,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self {
            filter: FilterParams::default(),
            view: ReportView::All,
            heatmap_by: HeatmapDimension::Stage,
            heatmap_stage: None,
            seed: 0,
        }
    }
}

// ── Report model ──────────────────────────────────────────────────────────────

/// Filter parameters echoed back with the matched counts.
#[derive(Debug, Clone, Serialize)]
pub struct FilterSummary {
    pub row_count: usize,
    /// Distinct cases among the matched rows.
    pub case_count: usize,
    pub territory: Option<String>,
    /// The date window actually applied after fallback resolution.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Sorted distinct values of the filterable dimensions, taken from the
/// normalized table before any filtering (the option lists a front-end
/// offers for `--territory` and `--stage`).
#[derive(Debug, Clone, Serialize)]
pub struct DimensionInventory {
    pub territories: Vec<String>,
    pub stages: Vec<String>,
}

/// Projections view: cancellation risk listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionsView {
    pub canceled_case_count: usize,
    pub canceled: Vec<CanceledOrder>,
}

/// Resources view: capacity and quality analyses.
#[derive(Debug, Clone, Serialize)]
pub struct ResourcesView {
    pub heatmap: DurationHeatmap,
    pub example_timeline: Option<CaseTimeline>,
    pub load_vs_rating: Vec<LoadRatingPoint>,
    pub load_vs_duration: Vec<LoadDurationPoint>,
}

/// Details view: per-day and per-stage breakdowns.
#[derive(Debug, Clone, Serialize)]
pub struct DetailsView {
    pub daily_cancellations: Vec<DailyCancellationPoint>,
    pub norms: Vec<NormsComparisonRow>,
    pub cancellation_reasons: Vec<CancellationReason>,
}

/// Run bookkeeping attached to every report.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    /// Local wall-clock time the report was generated.
    pub generated_at: String,
    pub load_stats: LoadStats,
    pub load_time_seconds: f64,
    pub aggregate_time_seconds: f64,
}

/// The fully-assembled analysis for one invocation.
///
/// Views not requested, or empty because no rows matched the filters, are
/// `None`; the summary's counts distinguish the two.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub summary: FilterSummary,
    pub dimensions: DimensionInventory,
    pub projections: Option<ProjectionsView>,
    pub resources: Option<ResourcesView>,
    pub details: Option<DetailsView>,
    pub metadata: RunMetadata,
}

impl DashboardReport {
    /// Chart projections for every aggregate the report carries.
    ///
    /// The canceled-order listing stays tabular and is not included.
    pub fn chart_specs(&self) -> Vec<ChartSpec> {
        let mut specs = Vec::new();
        if let Some(resources) = &self.resources {
            specs.push(chart::duration_heatmap_chart(&resources.heatmap));
            if let Some(timeline) = &resources.example_timeline {
                specs.push(chart::case_timeline_chart(timeline));
            }
            specs.push(chart::load_vs_rating_chart(&resources.load_vs_rating));
            specs.push(chart::load_vs_duration_chart(&resources.load_vs_duration));
        }
        if let Some(details) = &self.details {
            specs.push(chart::daily_cancellations_chart(&details.daily_cancellations));
            specs.push(chart::norms_comparison_chart(&details.norms));
            specs.push(chart::cancellation_reasons_chart(&details.cancellation_reasons));
        }
        specs
    }
}

// ── Assembly ──────────────────────────────────────────────────────────────────

/// Run the filter and every requested aggregation over the table.
///
/// An empty filtered subset still produces a report: the summary carries the
/// zero counts and all views come back `None`, which the renderers turn into
/// a "no data" notice instead of an error.
pub fn build_report(
    table: &EventTable,
    params: &ReportParams,
    norms: &NormativeDurations,
    load_stats: &LoadStats,
    load_time_seconds: f64,
) -> DashboardReport {
    let started = Instant::now();

    let view = filter_rows(table, &params.filter);
    let summary = FilterSummary {
        row_count: view.len(),
        case_count: view.case_count(),
        territory: params.filter.territory.clone(),
        start_date: view.range.map(|r| r.start),
        end_date: view.range.map(|r| r.end),
    };
    let dimensions = DimensionInventory {
        territories: table.territories(),
        stages: table.stages(),
    };
    let rows = view.rows.as_slice();

    let projections = if params.view.includes_projections() && !rows.is_empty() {
        let canceled = aggregate::canceled_orders(rows);
        Some(ProjectionsView {
            canceled_case_count: canceled.len(),
            canceled,
        })
    } else {
        None
    };

    let resources = if params.view.includes_resources() && !rows.is_empty() {
        Some(ResourcesView {
            heatmap: aggregate::duration_heatmap(
                rows,
                params.heatmap_by,
                params.heatmap_stage.as_deref(),
            ),
            example_timeline: aggregate::example_case_timeline(rows, params.seed),
            load_vs_rating: aggregate::load_vs_rating(rows),
            load_vs_duration: aggregate::load_vs_duration(rows),
        })
    } else {
        None
    };

    let details = if params.view.includes_details() && !rows.is_empty() {
        Some(DetailsView {
            daily_cancellations: aggregate::daily_cancellations(rows),
            norms: aggregate::norms_comparison(rows, norms),
            cancellation_reasons: aggregate::cancellation_reasons(rows),
        })
    } else {
        None
    };

    let aggregate_time_seconds = started.elapsed().as_secs_f64();
    debug!(
        "Report assembled: {} rows, {} cases, {:.3}s",
        summary.row_count, summary.case_count, aggregate_time_seconds
    );

    DashboardReport {
        summary,
        dimensions,
        projections,
        resources,
        details,
        metadata: RunMetadata {
            generated_at: format_timestamp(Local::now().naive_local()),
            load_stats: load_stats.clone(),
            load_time_seconds,
            aggregate_time_seconds,
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
