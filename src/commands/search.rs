use crate::commands::CommandReport;
use crate::ssp::config::load_config;
use crate::ssp::geo;
use crate::ssp::paths::resolve_paths;
use crate::ssp::search;
use anyhow::Result;
use std::collections::BTreeSet;

const MAX_LISTED_MATCHES: usize = 10;

pub fn run(
    query: &str,
    radius: Option<f64>,
    categories: &[String],
    export: bool,
    output_file: Option<&str>,
) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("search");

    let radius_km = radius.unwrap_or(cfg.search.default_radius_km);
    let category_set: Option<BTreeSet<String>> = if categories.is_empty() {
        None
    } else {
        Some(categories.iter().cloned().collect())
    };

    let result = search::search(
        &paths.output_dir,
        &cfg,
        query,
        radius_km,
        category_set.as_ref(),
    )?;

    report.detail(format!("query={query} radius={radius_km}km"));
    report.detail(format!(
        "scanned {} records across available artifacts",
        result.total_records_scanned
    ));
    if result.skipped_records > 0 {
        report.detail(format!(
            "skipped {} malformed records",
            result.skipped_records
        ));
    }
    report.detail(format!("matches={}", result.matches.len()));
    for (category, count) in &result.stats_by_category {
        let label = cfg
            .categories
            .get(category)
            .cloned()
            .unwrap_or_else(|| category.clone());
        report.detail(format!("  {label}: {count}"));
    }
    for m in result.matches.iter().take(MAX_LISTED_MATCHES) {
        let place = geo::extract_address(&m.raw, &cfg.fields)
            .unwrap_or_else(|| "sem endereço".to_string());
        report.detail(format!(
            "  {} {} ({:.5}, {:.5}) {place}",
            geo::format_distance(m.distance_km),
            m.category,
            m.latitude,
            m.longitude
        ));
    }
    if result.matches.len() > MAX_LISTED_MATCHES {
        report.detail(format!(
            "  … and {} more",
            result.matches.len() - MAX_LISTED_MATCHES
        ));
    }

    if export || output_file.is_some() {
        let path = search::export_detailed_results(&paths.output_dir, &result, output_file)?;
        report.detail(format!("exported {}", path.display()));
    }

    Ok(report)
}
