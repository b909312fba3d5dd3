use crate::commands::CommandReport;
use crate::error::SspError;
use crate::ssp::audit;
use crate::ssp::cache::{self, CityFileInfo, ProcessingCache};
use crate::ssp::config::load_config;
use crate::ssp::filter;
use crate::ssp::paths::resolve_paths;
use crate::ssp::store;
use anyhow::Result;
use serde_json::{Value, json};

pub fn run(category: &str, year: i32, city: &str) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("filter-city");

    cache::ensure_year_allowed(year, cfg.cache.max_year)?;

    let mut ledger = ProcessingCache::load(&paths.cache_file);
    if cfg.cache.enabled
        && !cfg.cache.force_reprocess
        && ledger.is_city_processed(category, year, city)
    {
        report.detail(format!(
            "{category}_{year} already filtered for '{city}', skipping"
        ));
        if let Some(existing) = store::load_city_artifact(&paths, category, year, city)? {
            report.detail(format!(
                "existing sibling keeps {} records",
                existing.records.len()
            ));
        }
        return Ok(report);
    }

    // the full download must be recorded before any city is carved out of it
    if !ledger.is_file_processed(category, year) {
        return Err(SspError::InvalidState {
            category: category.to_string(),
            year,
            city: city.to_string(),
        }
        .into());
    }

    let artifact = store::require_artifact(&paths.output_dir, category, year)?;
    let loaded = store::load_artifact(&artifact)?;
    let outcome = filter::filter_by_city(&loaded.records, city, &cfg.city_match);
    if !outcome.had_city_fields {
        report.detail("no city-bearing fields found; keeping the full record set");
    }

    let payload = json!({
        "categoria": loaded.category,
        "cidade_filtro": city,
        "total_registros": outcome.total_records,
        "registros_filtrados": outcome.filtered_records,
        "dados": outcome
            .records
            .iter()
            .map(|r| Value::Object(r.raw.clone()))
            .collect::<Vec<_>>(),
    });
    let city_path = store::city_artifact_path(&paths, category, year, city);
    store::write_artifact(&city_path, &payload)?;

    ledger.mark_city_processed(
        category,
        year,
        city,
        CityFileInfo {
            filtered_records: outcome.filtered_records,
            total_records: outcome.total_records,
        },
    )?;
    audit::append_event(
        &paths,
        "filter-city",
        "ok",
        &format!(
            "{category}_{year} city={city} kept={} of {}",
            outcome.filtered_records, outcome.total_records
        ),
    )?;

    report.detail(format!(
        "wrote {} ({} of {} records)",
        city_path.display(),
        outcome.filtered_records,
        outcome.total_records
    ));
    Ok(report)
}
