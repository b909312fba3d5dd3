use crate::commands::CommandReport;
use crate::ssp::audit;
use crate::ssp::cache::{self, FileInfo, ProcessingCache};
use crate::ssp::config::load_config;
use crate::ssp::paths::resolve_paths;
use crate::ssp::store;
use anyhow::Result;

pub fn run(category: &str, year: i32) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("register");

    // enforced before any acquisition, never after
    cache::ensure_year_allowed(year, cfg.cache.max_year)?;

    let mut ledger = ProcessingCache::load(&paths.cache_file);
    if cfg.cache.enabled && !cfg.cache.force_reprocess && ledger.is_file_processed(category, year)
    {
        report.detail(format!("{category}_{year} already processed, skipping"));
        return Ok(report);
    }

    if !cfg.categories.contains_key(category) {
        report.detail(format!("note: '{category}' is not a configured category"));
    }

    let artifact = store::require_artifact(&paths.output_dir, category, year)?;
    let loaded = store::load_artifact(&artifact)?;
    let filename = artifact
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let total_records = loaded.records.len() as u64 + loaded.skipped_records;

    ledger.mark_file_processed(
        category,
        year,
        FileInfo {
            filename: filename.clone(),
            total_records,
            city_filter: "ALL".to_string(),
        },
    )?;
    audit::append_event(
        &paths,
        "register",
        "ok",
        &format!("{category}_{year} records={total_records}"),
    )?;

    report.detail(format!(
        "registered {category}_{year} ({total_records} records, {filename})"
    ));
    Ok(report)
}
