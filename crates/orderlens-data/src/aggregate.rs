//! Chart-ready aggregations over filtered event rows.
//!
//! Every function here is pure: it takes the filtered row set produced by
//! [`crate::filter::filter_rows`] and returns a small owned aggregate. All
//! outputs are deterministic for a given input (and seed, for the example
//! timeline), so repeated runs over the same data yield identical reports.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use orderlens_core::models::{EventRecord, OrderStatus};
use orderlens_core::norms::NormativeDurations;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Earliest and latest event dates in the row set.
fn observed_date_span(rows: &[&EventRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let first = rows.iter().map(|r| r.date).min()?;
    let last = rows.iter().map(|r| r.date).max()?;
    Some((first, last))
}

/// Hour of each case's chronologically first event.
///
/// Both scatter series join per-case values on this hour, so they must agree
/// on what "the hour a case started" means. Equal start times keep the
/// earlier row.
fn case_start_hours<'a>(rows: &[&'a EventRecord]) -> HashMap<&'a str, u32> {
    let mut firsts: HashMap<&str, (NaiveDateTime, u32)> = HashMap::new();
    for row in rows {
        match firsts.get(row.case.as_str()) {
            Some((seen, _)) if *seen <= row.start_time => {}
            _ => {
                firsts.insert(row.case.as_str(), (row.start_time, row.hour));
            }
        }
    }
    firsts
        .into_iter()
        .map(|(case, (_, hour))| (case, hour))
        .collect()
}

/// Mean distinct cases per (date, hour) group, keyed by hour.
///
/// Only observed groups enter the average, so a day on which an hour saw no
/// events does not dilute that hour.
fn hourly_load_map(rows: &[&EventRecord]) -> BTreeMap<u32, f64> {
    let mut per_group: HashMap<(NaiveDate, u32), HashSet<&str>> = HashMap::new();
    for row in rows {
        per_group
            .entry((row.date, row.hour))
            .or_default()
            .insert(row.case.as_str());
    }

    let mut sums: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
    for ((_, hour), cases) in &per_group {
        let slot = sums.entry(*hour).or_insert((0.0, 0));
        slot.0 += cases.len() as f64;
        slot.1 += 1;
    }

    sums.into_iter()
        .map(|(hour, (total, groups))| (hour, total / f64::from(groups)))
        .collect()
}

// ── Daily cancellations ───────────────────────────────────────────────────────

/// One day of the gap-free cancellation series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCancellationPoint {
    pub date: NaiveDate,
    /// Distinct canceled cases on this day; zero on days with none.
    pub canceled_cases: u64,
}

/// Distinct canceled cases per day over the observed date span.
///
/// Days without cancellations are filled with zero, so the series has no
/// gaps between the earliest and latest date seen in `rows`.
pub fn daily_cancellations(rows: &[&EventRecord]) -> Vec<DailyCancellationPoint> {
    let (first, last) = match observed_date_span(rows) {
        Some(span) => span,
        None => return Vec::new(),
    };

    let mut per_day: HashMap<NaiveDate, HashSet<&str>> = HashMap::new();
    for row in rows {
        if row.is_canceled {
            per_day
                .entry(row.date)
                .or_default()
                .insert(row.case.as_str());
        }
    }

    first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(|date| DailyCancellationPoint {
            date,
            canceled_cases: per_day.get(&date).map_or(0, |cases| cases.len() as u64),
        })
        .collect()
}

// ── Duration heatmap ──────────────────────────────────────────────────────────

/// Row axis of the duration heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapDimension {
    Stage,
    Territory,
}

impl HeatmapDimension {
    /// Parse a CLI label. Unknown labels fall back to `Stage`.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("territory") {
            Self::Territory
        } else {
            Self::Stage
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Territory => "territory",
        }
    }
}

/// One label row of the heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub label: String,
    /// One cell per entry in [`DurationHeatmap::hours`]; `None` where the
    /// label saw no events in that hour.
    pub cells: Vec<Option<f64>>,
}

/// Mean stage duration pivoted to (label, hour of day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationHeatmap {
    pub dimension: HeatmapDimension,
    /// Hours observed in the contributing rows, ascending.
    pub hours: Vec<u32>,
    /// One row per observed label, sorted by label.
    pub rows: Vec<HeatmapRow>,
}

/// Mean event duration per (label, start hour) cell over non-canceled rows.
///
/// `stage` narrows the contributing rows to one stage label, which is mainly
/// useful with the territory dimension. Cells without observations stay
/// empty rather than reading as zero.
pub fn duration_heatmap(
    rows: &[&EventRecord],
    dimension: HeatmapDimension,
    stage: Option<&str>,
) -> DurationHeatmap {
    let mut sums: BTreeMap<&str, BTreeMap<u32, (f64, u32)>> = BTreeMap::new();
    let mut hours: BTreeSet<u32> = BTreeSet::new();

    for row in rows {
        if row.is_canceled {
            continue;
        }
        if let Some(wanted) = stage {
            if row.stage != wanted {
                continue;
            }
        }
        let label = match dimension {
            HeatmapDimension::Stage => row.stage.as_str(),
            HeatmapDimension::Territory => row.territory.as_str(),
        };
        hours.insert(row.hour);
        let slot = sums
            .entry(label)
            .or_default()
            .entry(row.hour)
            .or_insert((0.0, 0));
        slot.0 += row.duration_minutes;
        slot.1 += 1;
    }

    let hours: Vec<u32> = hours.into_iter().collect();
    let rows = sums
        .into_iter()
        .map(|(label, by_hour)| {
            let cells = hours
                .iter()
                .map(|hour| by_hour.get(hour).map(|(total, count)| total / f64::from(*count)))
                .collect();
            HeatmapRow {
                label: label.to_string(),
                cells,
            }
        })
        .collect();

    DurationHeatmap {
        dimension,
        hours,
        rows,
    }
}

// ── Load vs duration ──────────────────────────────────────────────────────────

/// One hour's pairing of load and mean total order duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDurationPoint {
    pub hour: u32,
    pub avg_cases_started: f64,
    /// Mean per-case total duration over cases starting in this hour.
    pub avg_total_duration: f64,
}

/// Join hourly load with mean per-case total duration by case start hour.
///
/// Case totals sum non-canceled rows only; a case with nothing left after
/// that exclusion drops out. Hours present on both sides survive the join.
pub fn load_vs_duration(rows: &[&EventRecord]) -> Vec<LoadDurationPoint> {
    let load = hourly_load_map(rows);
    let start_hours = case_start_hours(rows);

    let mut totals: HashMap<&str, f64> = HashMap::new();
    for row in rows {
        if !row.is_canceled {
            *totals.entry(row.case.as_str()).or_insert(0.0) += row.duration_minutes;
        }
    }

    let mut by_hour: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
    for (case, total) in &totals {
        if let Some(hour) = start_hours.get(case) {
            let slot = by_hour.entry(*hour).or_insert((0.0, 0));
            slot.0 += *total;
            slot.1 += 1;
        }
    }

    by_hour
        .into_iter()
        .filter_map(|(hour, (sum, count))| {
            load.get(&hour).map(|avg_cases_started| LoadDurationPoint {
                hour,
                avg_cases_started: *avg_cases_started,
                avg_total_duration: sum / f64::from(count),
            })
        })
        .collect()
}

// ── Load vs rating ────────────────────────────────────────────────────────────

/// One hour's pairing of load and mean delivery rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRatingPoint {
    pub hour: u32,
    pub avg_cases_started: f64,
    /// Mean first delivery rating over delivered cases starting in this hour.
    pub avg_rating: f64,
}

/// Join hourly load with mean delivery rating by case start hour.
///
/// Only delivered cases contribute, each with its chronologically first
/// non-missing rating. A delivered case that never received a rating is
/// excluded entirely.
pub fn load_vs_rating(rows: &[&EventRecord]) -> Vec<LoadRatingPoint> {
    let load = hourly_load_map(rows);
    let start_hours = case_start_hours(rows);

    // First rated event per delivered case, by start time.
    let mut first_rated: HashMap<&str, (NaiveDateTime, f64)> = HashMap::new();
    for row in rows {
        if row.order_status != OrderStatus::Delivered {
            continue;
        }
        let rating = match row.delivery_rating {
            Some(value) => value,
            None => continue,
        };
        match first_rated.get(row.case.as_str()) {
            Some((seen, _)) if *seen <= row.start_time => {}
            _ => {
                first_rated.insert(row.case.as_str(), (row.start_time, rating));
            }
        }
    }

    let mut by_hour: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
    for (case, (_, rating)) in &first_rated {
        if let Some(hour) = start_hours.get(case) {
            let slot = by_hour.entry(*hour).or_insert((0.0, 0));
            slot.0 += *rating;
            slot.1 += 1;
        }
    }

    by_hour
        .into_iter()
        .filter_map(|(hour, (sum, count))| {
            load.get(&hour).map(|avg_cases_started| LoadRatingPoint {
                hour,
                avg_cases_started: *avg_cases_started,
                avg_rating: sum / f64::from(count),
            })
        })
        .collect()
}

// ── Norms comparison ──────────────────────────────────────────────────────────

/// Actual vs normative mean duration for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormsComparisonRow {
    pub stage: String,
    /// Mean duration over non-canceled rows; zero when the stage never occurs.
    pub actual_minutes: f64,
    pub expected_minutes: f64,
    /// Whether the stage occurred in the filtered data at all.
    pub present_in_data: bool,
}

/// Compare per-stage mean durations against the normative lookup.
///
/// One row per normative stage, in label order. Stages named by the lookup
/// but absent from the data report an actual of zero and are flagged so the
/// renderer can call them out.
pub fn norms_comparison(
    rows: &[&EventRecord],
    norms: &NormativeDurations,
) -> Vec<NormsComparisonRow> {
    let mut sums: HashMap<&str, (f64, u32)> = HashMap::new();
    for row in rows {
        if !row.is_canceled {
            let slot = sums.entry(row.stage.as_str()).or_insert((0.0, 0));
            slot.0 += row.duration_minutes;
            slot.1 += 1;
        }
    }

    norms
        .iter()
        .map(|(stage, expected_minutes)| match sums.get(stage) {
            Some((total, count)) => NormsComparisonRow {
                stage: stage.to_string(),
                actual_minutes: total / f64::from(*count),
                expected_minutes,
                present_in_data: true,
            },
            None => NormsComparisonRow {
                stage: stage.to_string(),
                actual_minutes: 0.0,
                expected_minutes,
                present_in_data: false,
            },
        })
        .collect()
}

// ── Cancellation reasons ──────────────────────────────────────────────────────

/// Count of cancellation events sharing one stage label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationReason {
    pub stage: String,
    pub count: u64,
}

/// Frequency of cancellation-event stage labels.
///
/// Counts rows, not distinct cases. Sorted by count descending, then by
/// label so equal counts order deterministically.
pub fn cancellation_reasons(rows: &[&EventRecord]) -> Vec<CancellationReason> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for row in rows {
        if row.is_canceled {
            *counts.entry(row.stage.as_str()).or_insert(0) += 1;
        }
    }

    let mut reasons: Vec<CancellationReason> = counts
        .into_iter()
        .map(|(stage, count)| CancellationReason {
            stage: stage.to_string(),
            count,
        })
        .collect();
    reasons.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.stage.cmp(&b.stage)));
    reasons
}

// ── Example case timeline ─────────────────────────────────────────────────────

/// One event of the example timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub stage: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub territory: String,
}

/// The full ordered event sequence of one selected case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseTimeline {
    pub case: String,
    /// Whether the selected case ended in cancellation.
    pub canceled: bool,
    pub events: Vec<TimelineEvent>,
}

/// Pick one case and return its event sequence sorted by start time.
///
/// Selection is uniform over candidate cases via a seeded generator, so the
/// same seed over the same rows picks the same case. Non-canceled cases are
/// preferred; canceled ones are the fallback when no others exist.
pub fn example_case_timeline(rows: &[&EventRecord], seed: u64) -> Option<CaseTimeline> {
    // Candidates in first-appearance order keep selection stable across runs.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut preferred: Vec<&str> = Vec::new();
    let mut fallback: Vec<&str> = Vec::new();
    for row in rows {
        if seen.insert(row.case.as_str()) {
            if row.order_status == OrderStatus::Canceled {
                fallback.push(row.case.as_str());
            } else {
                preferred.push(row.case.as_str());
            }
        }
    }

    let candidates = if preferred.is_empty() {
        &fallback
    } else {
        &preferred
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let case = *candidates.choose(&mut rng)?;

    let mut events: Vec<TimelineEvent> = rows
        .iter()
        .filter(|row| row.case == case)
        .map(|row| TimelineEvent {
            stage: row.stage.clone(),
            start_time: row.start_time,
            end_time: row.end_time,
            territory: row.territory.clone(),
        })
        .collect();
    events.sort_by_key(|event| event.start_time);

    Some(CaseTimeline {
        case: case.to_string(),
        canceled: preferred.is_empty(),
        events,
    })
}

// ── Canceled-order listing ────────────────────────────────────────────────────

/// One canceled order with its first cancellation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanceledOrder {
    pub case: String,
    /// Stage label of the earliest cancellation event.
    pub stage: String,
    pub start_time: NaiveDateTime,
}

/// One row per distinct canceled case, keyed to its earliest cancellation
/// event. Sorted by that event's start time, then by case id on ties.
pub fn canceled_orders(rows: &[&EventRecord]) -> Vec<CanceledOrder> {
    let mut first_cancel: HashMap<&str, &EventRecord> = HashMap::new();
    for row in rows {
        if !row.is_canceled {
            continue;
        }
        match first_cancel.get(row.case.as_str()) {
            Some(seen) if seen.start_time <= row.start_time => {}
            _ => {
                first_cancel.insert(row.case.as_str(), row);
            }
        }
    }

    let mut orders: Vec<CanceledOrder> = first_cancel
        .into_values()
        .map(|row| CanceledOrder {
            case: row.case.clone(),
            stage: row.stage.clone(),
            start_time: row.start_time,
        })
        .collect();
    orders.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.case.cmp(&b.case))
    });
    orders
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn row(case: &str, stage: &str, day: u32, hour: u32, minutes: f64) -> EventRecord {
        let start = NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        EventRecord {
            case: case.to_string(),
            stage: stage.to_string(),
            start_time: start,
            end_time: start + Duration::minutes(minutes as i64),
            territory: "North".to_string(),
            delivery_rating: None,
            duration_minutes: minutes,
            date: start.date(),
            hour,
            is_canceled: false,
            order_status: OrderStatus::InProgress,
        }
    }

    fn canceled(mut record: EventRecord) -> EventRecord {
        record.is_canceled = true;
        record.order_status = OrderStatus::Canceled;
        record
    }

    fn delivered(mut record: EventRecord, rating: Option<f64>) -> EventRecord {
        record.order_status = OrderStatus::Delivered;
        record.delivery_rating = rating;
        record
    }

    fn in_territory(mut record: EventRecord, territory: &str) -> EventRecord {
        record.territory = territory.to_string();
        record
    }

    fn refs(rows: &[EventRecord]) -> Vec<&EventRecord> {
        rows.iter().collect()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    // ── daily_cancellations ───────────────────────────────────────────────────

    #[test]
    fn test_daily_cancellations_counts_distinct_cases() {
        let rows = vec![
            canceled(row("ord-1", "Cancellation: out of stock", 1, 9, 0.0)),
            canceled(row("ord-1", "Cancellation: out of stock", 1, 10, 0.0)),
            canceled(row("ord-2", "Cancellation: customer refused", 1, 11, 0.0)),
        ];
        let series = daily_cancellations(&refs(&rows));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, date(1));
        assert_eq!(series[0].canceled_cases, 2);
    }

    #[test]
    fn test_daily_cancellations_densified_over_observed_span() {
        let rows = vec![
            canceled(row("ord-1", "Cancellation: out of stock", 1, 9, 0.0)),
            row("ord-2", "Assembly", 4, 10, 30.0),
        ];
        let series = daily_cancellations(&refs(&rows));
        let counts: Vec<u64> = series.iter().map(|p| p.canceled_cases).collect();
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].date, date(1));
        assert_eq!(series[3].date, date(4));
        assert_eq!(counts, vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_daily_cancellations_all_zero_without_cancellations() {
        let rows = vec![
            row("ord-1", "Assembly", 2, 9, 30.0),
            row("ord-2", "Assembly", 3, 9, 30.0),
        ];
        let series = daily_cancellations(&refs(&rows));
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|p| p.canceled_cases == 0));
    }

    #[test]
    fn test_daily_cancellations_empty_rows() {
        assert!(daily_cancellations(&[]).is_empty());
    }

    // ── duration_heatmap ──────────────────────────────────────────────────────

    #[test]
    fn test_heatmap_mean_per_stage_and_hour() {
        let rows = vec![
            row("ord-1", "Assembly", 1, 9, 10.0),
            row("ord-2", "Assembly", 1, 9, 20.0),
            row("ord-3", "Packaging", 1, 10, 30.0),
        ];
        let heatmap = duration_heatmap(&refs(&rows), HeatmapDimension::Stage, None);

        assert_eq!(heatmap.hours, vec![9, 10]);
        assert_eq!(heatmap.rows.len(), 2);
        assert_eq!(heatmap.rows[0].label, "Assembly");
        assert!((heatmap.rows[0].cells[0].unwrap() - 15.0).abs() < 1e-9);
        assert_eq!(heatmap.rows[0].cells[1], None);
        assert_eq!(heatmap.rows[1].label, "Packaging");
        assert_eq!(heatmap.rows[1].cells[0], None);
        assert!((heatmap.rows[1].cells[1].unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_heatmap_excludes_canceled_rows() {
        let rows = vec![
            row("ord-1", "Assembly", 1, 9, 10.0),
            canceled(row("ord-2", "Assembly", 1, 9, 500.0)),
        ];
        let heatmap = duration_heatmap(&refs(&rows), HeatmapDimension::Stage, None);
        assert!((heatmap.rows[0].cells[0].unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_heatmap_territory_dimension_sorted_labels() {
        let rows = vec![
            in_territory(row("ord-1", "Assembly", 1, 9, 10.0), "West"),
            in_territory(row("ord-2", "Assembly", 1, 9, 20.0), "East"),
        ];
        let heatmap = duration_heatmap(&refs(&rows), HeatmapDimension::Territory, None);
        let labels: Vec<&str> = heatmap.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["East", "West"]);
    }

    #[test]
    fn test_heatmap_stage_restriction() {
        let rows = vec![
            row("ord-1", "Assembly", 1, 9, 10.0),
            row("ord-2", "Packaging", 1, 14, 40.0),
        ];
        let heatmap =
            duration_heatmap(&refs(&rows), HeatmapDimension::Stage, Some("Assembly"));
        assert_eq!(heatmap.hours, vec![9]);
        assert_eq!(heatmap.rows.len(), 1);
        assert_eq!(heatmap.rows[0].label, "Assembly");
    }

    #[test]
    fn test_heatmap_empty_rows() {
        let heatmap = duration_heatmap(&[], HeatmapDimension::Stage, None);
        assert!(heatmap.hours.is_empty());
        assert!(heatmap.rows.is_empty());
    }

    #[test]
    fn test_heatmap_dimension_from_label() {
        assert_eq!(HeatmapDimension::from_label("territory"), HeatmapDimension::Territory);
        assert_eq!(HeatmapDimension::from_label("Territory"), HeatmapDimension::Territory);
        assert_eq!(HeatmapDimension::from_label("stage"), HeatmapDimension::Stage);
        assert_eq!(HeatmapDimension::from_label("bogus"), HeatmapDimension::Stage);
    }

    // ── load_vs_duration ──────────────────────────────────────────────────────

    #[test]
    fn test_load_averaged_over_observed_days_only() {
        let rows = vec![
            row("ord-1", "Assembly", 1, 9, 30.0),
            row("ord-2", "Assembly", 1, 9, 30.0),
            row("ord-3", "Assembly", 2, 9, 30.0),
            row("ord-4", "Assembly", 1, 10, 30.0),
        ];
        let series = load_vs_duration(&refs(&rows));

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].hour, 9);
        // Hour 9: two cases on day 1, one on day 2.
        assert!((series[0].avg_cases_started - 1.5).abs() < 1e-9);
        // Hour 10 was only observed on day 1, so that single day is the mean.
        assert_eq!(series[1].hour, 10);
        assert!((series[1].avg_cases_started - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_counts_distinct_cases_per_group() {
        let rows = vec![
            row("ord-1", "Assembly", 1, 9, 30.0),
            row("ord-1", "Packaging", 1, 9, 10.0),
        ];
        let series = load_vs_duration(&refs(&rows));
        assert_eq!(series.len(), 1);
        assert!((series[0].avg_cases_started - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_vs_duration_sums_case_durations() {
        let rows = vec![
            row("ord-1", "Assembly", 1, 9, 30.0),
            row("ord-1", "Packaging", 1, 11, 20.0),
        ];
        let series = load_vs_duration(&refs(&rows));

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].hour, 9);
        assert!((series[0].avg_total_duration - 50.0).abs() < 1e-9);
        assert!((series[0].avg_cases_started - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_vs_duration_skips_canceled_portions() {
        let rows = vec![
            row("ord-1", "Assembly", 1, 9, 30.0),
            canceled(row("ord-1", "Cancellation: out of stock", 1, 10, 99.0)),
            canceled(row("ord-2", "Cancellation: customer refused", 1, 9, 99.0)),
        ];
        let series = load_vs_duration(&refs(&rows));

        // ord-2 has no non-canceled rows and drops out entirely.
        assert_eq!(series.len(), 1);
        assert!((series[0].avg_total_duration - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_vs_duration_joins_on_first_event_hour() {
        // Later event listed first; the chronological first (hour 9) wins.
        let rows = vec![
            row("ord-1", "Packaging", 1, 14, 20.0),
            row("ord-1", "Assembly", 1, 9, 30.0),
        ];
        let series = load_vs_duration(&refs(&rows));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].hour, 9);
        assert!((series[0].avg_total_duration - 50.0).abs() < 1e-9);
    }

    // ── load_vs_rating ────────────────────────────────────────────────────────

    #[test]
    fn test_load_vs_rating_delivered_cases_only() {
        let rows = vec![
            delivered(row("ord-1", "Delivery completed", 1, 9, 45.0), Some(5.0)),
            row("ord-2", "Assembly", 1, 9, 30.0),
        ];
        let series = load_vs_rating(&refs(&rows));

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].hour, 9);
        assert!((series[0].avg_rating - 5.0).abs() < 1e-9);
        // Load still counts both cases active in the hour.
        assert!((series[0].avg_cases_started - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_vs_rating_takes_first_rating_chronologically() {
        let rows = vec![
            delivered(row("ord-1", "Assembly", 1, 9, 30.0), None),
            delivered(row("ord-1", "Delivery completed", 1, 12, 45.0), Some(4.0)),
            delivered(row("ord-1", "Follow-up call", 1, 15, 5.0), Some(2.0)),
        ];
        let series = load_vs_rating(&refs(&rows));

        assert_eq!(series.len(), 1);
        // Joined at the case's first event hour, not the rated event's hour.
        assert_eq!(series[0].hour, 9);
        assert!((series[0].avg_rating - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_vs_rating_excludes_unrated_delivered_case() {
        let rows = vec![delivered(row("ord-1", "Delivery completed", 1, 9, 45.0), None)];
        let series = load_vs_rating(&refs(&rows));
        assert!(series.is_empty());
    }

    // ── norms_comparison ──────────────────────────────────────────────────────

    #[test]
    fn test_norms_comparison_actual_vs_expected() {
        let rows = vec![
            row("ord-1", "Assembly", 1, 9, 30.0),
            row("ord-2", "Assembly", 1, 10, 35.0),
        ];
        let comparison = norms_comparison(&refs(&rows), &NormativeDurations::default());

        let assembly = comparison.iter().find(|c| c.stage == "Assembly").unwrap();
        assert!((assembly.actual_minutes - 32.5).abs() < 1e-9);
        assert!((assembly.expected_minutes - 30.0).abs() < 1e-9);
        assert!(assembly.present_in_data);
    }

    #[test]
    fn test_norms_comparison_absent_stage_reports_zero() {
        let rows = vec![row("ord-1", "Assembly", 1, 9, 30.0)];
        let comparison = norms_comparison(&refs(&rows), &NormativeDurations::default());

        let delivery = comparison.iter().find(|c| c.stage == "Delivery").unwrap();
        assert_eq!(delivery.actual_minutes, 0.0);
        assert!((delivery.expected_minutes - 45.0).abs() < 1e-9);
        assert!(!delivery.present_in_data);
    }

    #[test]
    fn test_norms_comparison_rows_in_label_order() {
        let comparison = norms_comparison(&[], &NormativeDurations::default());
        let stages: Vec<&str> = comparison.iter().map(|c| c.stage.as_str()).collect();
        assert_eq!(
            stages,
            vec!["Assembly", "Courier handoff", "Delivery", "Packaging"]
        );
    }

    #[test]
    fn test_norms_comparison_excludes_canceled_rows() {
        let rows = vec![
            row("ord-1", "Assembly", 1, 9, 30.0),
            canceled(row("ord-2", "Assembly", 1, 9, 500.0)),
        ];
        let comparison = norms_comparison(&refs(&rows), &NormativeDurations::default());
        let assembly = comparison.iter().find(|c| c.stage == "Assembly").unwrap();
        assert!((assembly.actual_minutes - 30.0).abs() < 1e-9);
    }

    // ── cancellation_reasons ──────────────────────────────────────────────────

    #[test]
    fn test_cancellation_reasons_sorted_by_count_desc() {
        let rows = vec![
            canceled(row("ord-1", "Cancellation: out of stock", 1, 9, 0.0)),
            canceled(row("ord-2", "Cancellation: out of stock", 1, 10, 0.0)),
            canceled(row("ord-3", "Cancellation: customer refused", 1, 11, 0.0)),
            row("ord-4", "Assembly", 1, 9, 30.0),
        ];
        let reasons = cancellation_reasons(&refs(&rows));

        assert_eq!(reasons.len(), 2);
        assert_eq!(reasons[0].stage, "Cancellation: out of stock");
        assert_eq!(reasons[0].count, 2);
        assert_eq!(reasons[1].stage, "Cancellation: customer refused");
        assert_eq!(reasons[1].count, 1);
    }

    #[test]
    fn test_cancellation_reasons_ties_break_by_label() {
        let rows = vec![
            canceled(row("ord-1", "Cancellation: b", 1, 9, 0.0)),
            canceled(row("ord-2", "Cancellation: a", 1, 10, 0.0)),
        ];
        let reasons = cancellation_reasons(&refs(&rows));
        assert_eq!(reasons[0].stage, "Cancellation: a");
        assert_eq!(reasons[1].stage, "Cancellation: b");
    }

    #[test]
    fn test_cancellation_reasons_empty_without_cancellations() {
        let rows = vec![row("ord-1", "Assembly", 1, 9, 30.0)];
        assert!(cancellation_reasons(&refs(&rows)).is_empty());
    }

    // ── example_case_timeline ─────────────────────────────────────────────────

    #[test]
    fn test_example_timeline_prefers_non_canceled() {
        let rows = vec![
            canceled(row("ord-1", "Cancellation: out of stock", 1, 9, 0.0)),
            delivered(row("ord-2", "Delivery completed", 1, 10, 45.0), Some(5.0)),
        ];
        for seed in 0..5 {
            let timeline = example_case_timeline(&refs(&rows), seed).expect("timeline");
            assert_eq!(timeline.case, "ord-2");
            assert!(!timeline.canceled);
        }
    }

    #[test]
    fn test_example_timeline_falls_back_to_canceled() {
        let rows = vec![canceled(row("ord-1", "Cancellation: out of stock", 1, 9, 0.0))];
        let timeline = example_case_timeline(&refs(&rows), 0).expect("timeline");
        assert_eq!(timeline.case, "ord-1");
        assert!(timeline.canceled);
    }

    #[test]
    fn test_example_timeline_seed_determinism() {
        let rows: Vec<EventRecord> = (0..10)
            .map(|i| row(&format!("ord-{}", i), "Assembly", 1, 9, 30.0))
            .collect();
        let first = example_case_timeline(&refs(&rows), 42).expect("timeline");
        let second = example_case_timeline(&refs(&rows), 42).expect("timeline");
        assert_eq!(first, second);
    }

    #[test]
    fn test_example_timeline_events_sorted_by_start() {
        let rows = vec![
            row("ord-1", "Packaging", 1, 14, 20.0),
            row("ord-1", "Assembly", 1, 9, 30.0),
            row("ord-1", "Delivery", 1, 16, 45.0),
        ];
        let timeline = example_case_timeline(&refs(&rows), 0).expect("timeline");
        let stages: Vec<&str> = timeline.events.iter().map(|e| e.stage.as_str()).collect();
        assert_eq!(stages, vec!["Assembly", "Packaging", "Delivery"]);
    }

    #[test]
    fn test_example_timeline_empty_rows() {
        assert!(example_case_timeline(&[], 0).is_none());
    }

    // ── canceled_orders ───────────────────────────────────────────────────────

    #[test]
    fn test_canceled_orders_one_row_per_case() {
        let rows = vec![
            canceled(row("ord-1", "Cancellation: retry", 2, 9, 0.0)),
            canceled(row("ord-1", "Cancellation: out of stock", 1, 9, 0.0)),
            canceled(row("ord-2", "Cancellation: customer refused", 3, 9, 0.0)),
        ];
        let orders = canceled_orders(&refs(&rows));

        assert_eq!(orders.len(), 2);
        // ord-1's earliest cancellation event wins.
        assert_eq!(orders[0].case, "ord-1");
        assert_eq!(orders[0].stage, "Cancellation: out of stock");
        assert_eq!(orders[0].start_time, date(1).and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(orders[1].case, "ord-2");
    }

    #[test]
    fn test_canceled_orders_sorted_by_time_then_case() {
        let rows = vec![
            canceled(row("ord-b", "Cancellation: out of stock", 1, 9, 0.0)),
            canceled(row("ord-a", "Cancellation: out of stock", 1, 9, 0.0)),
        ];
        let orders = canceled_orders(&refs(&rows));
        assert_eq!(orders[0].case, "ord-a");
        assert_eq!(orders[1].case, "ord-b");
    }

    #[test]
    fn test_canceled_orders_empty_without_cancellations() {
        let rows = vec![row("ord-1", "Assembly", 1, 9, 30.0)];
        assert!(canceled_orders(&refs(&rows)).is_empty());
    }
}
