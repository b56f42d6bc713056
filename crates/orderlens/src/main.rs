mod bootstrap;
mod render;

use anyhow::{Context, Result};
use orderlens_core::markers::MarkerRules;
use orderlens_core::norms::NormativeDurations;
use orderlens_core::settings::Settings;
use orderlens_core::time_utils::parse_date;
use orderlens_data::aggregate::HeatmapDimension;
use orderlens_data::cache::TableCache;
use orderlens_data::filter::FilterParams;
use orderlens_data::reader::LoaderConfig;
use orderlens_data::report::{build_report, ReportParams, ReportView};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("OrderLens v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Format: {}, Heatmap by: {}",
        settings.view,
        settings.format,
        settings.heatmap_by
    );

    let data_path = settings
        .data
        .clone()
        .or_else(bootstrap::discover_data_path)
        .context(
            "no event log found: pass --data or provide data/dataset.csv in the working directory",
        )?;

    let config = LoaderConfig::from_labels(&settings.delimiter, &settings.encoding)?;
    let rules = MarkerRules::new(&settings.cancel_marker, &settings.deliver_marker);

    let mut cache = TableCache::new(config, rules);
    let load_started = std::time::Instant::now();
    let (table, stats) = cache.get_or_load(&data_path)?;
    let load_time_seconds = load_started.elapsed().as_secs_f64();

    tracing::info!(
        "Loaded {} stage events across {} orders from {}",
        table.len(),
        table.case_count(),
        data_path.display()
    );

    if table.is_empty() {
        println!(
            "The event log {} contained no usable rows.",
            data_path.display()
        );
        return Ok(());
    }

    let norms = match &settings.norms {
        Some(path) => NormativeDurations::from_json_file(path)?,
        None => NormativeDurations::default(),
    };

    let params = ReportParams {
        filter: FilterParams {
            start_date: parse_cli_date(settings.from.as_deref(), "--from"),
            end_date: parse_cli_date(settings.to.as_deref(), "--to"),
            territory: settings.territory.clone(),
        },
        view: ReportView::from_label(&settings.view),
        heatmap_by: HeatmapDimension::from_label(&settings.heatmap_by),
        heatmap_stage: settings.stage.clone(),
        seed: settings.seed,
    };

    let report = build_report(&table, &params, &norms, &stats, load_time_seconds);

    match settings.format.as_str() {
        "json" => {
            let charts = report.chart_specs();
            let payload = serde_json::json!({
                "report": report,
                "charts": charts,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        _ => {
            print!("{}", render::render_text(&report));
        }
    }

    Ok(())
}

/// Parse an optional CLI date, warning rather than failing on bad input so
/// that the observed-span fallback applies.
fn parse_cli_date(value: Option<&str>, flag: &str) -> Option<chrono::NaiveDate> {
    let raw = value?;
    match parse_date(raw) {
        Some(date) => Some(date),
        None => {
            tracing::warn!("Ignoring unparseable {} value: {}", flag, raw);
            None
        }
    }
}
