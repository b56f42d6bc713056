//! Date-range and territory filtering of the normalized table.
//!
//! Filtered views are read-only projections: borrowing rows from the table,
//! never copying or mutating it. An empty view is a valid outcome and always
//! means "no rows matched", because degenerate range requests fall back to
//! the table's observed span instead of failing.

use chrono::NaiveDate;
use orderlens_core::models::{EventRecord, EventTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ── Parameters ────────────────────────────────────────────────────────────────

/// Caller-supplied filter parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Inclusive lower date bound; observed minimum when absent.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound; observed maximum when absent.
    pub end_date: Option<NaiveDate>,
    /// Restrict to one territory; `None` means all territories.
    pub territory: Option<String>,
}

/// The inclusive date window actually applied after fallback resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Resolve the requested date range against the table's observed span.
///
/// Missing bounds are filled from the observed span; an inverted request
/// (start after end) falls back to the full span. `None` only when the table
/// itself is empty.
pub fn resolve_date_range(table: &EventTable, params: &FilterParams) -> Option<ResolvedRange> {
    let (observed_min, observed_max) = table.date_span()?;
    let start = params.start_date.unwrap_or(observed_min);
    let end = params.end_date.unwrap_or(observed_max);
    if start > end {
        return Some(ResolvedRange {
            start: observed_min,
            end: observed_max,
        });
    }
    Some(ResolvedRange { start, end })
}

// ── Filtered view ─────────────────────────────────────────────────────────────

/// A read-only filtered projection of the table.
#[derive(Debug)]
pub struct FilteredView<'a> {
    /// Rows passing the filters, in original table order.
    pub rows: Vec<&'a EventRecord>,
    /// The date window actually applied; `None` only for an empty table.
    pub range: Option<ResolvedRange>,
}

impl FilteredView<'_> {
    /// Number of rows in the view.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the view holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct cases in the view.
    pub fn case_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.case.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Apply date-range and territory filters to the table.
pub fn filter_rows<'a>(table: &'a EventTable, params: &FilterParams) -> FilteredView<'a> {
    let range = resolve_date_range(table, params);
    let rows = match range {
        Some(window) => table
            .rows
            .iter()
            .filter(|row| {
                row.date >= window.start
                    && row.date <= window.end
                    && params
                        .territory
                        .as_deref()
                        .map_or(true, |t| row.territory == t)
            })
            .collect(),
        None => Vec::new(),
    };
    FilteredView { rows, range }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
