use crate::commands::CommandReport;
use crate::ssp::cache::ProcessingCache;
use crate::ssp::paths::resolve_paths;
use anyhow::Result;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("cache-status");

    let cache = ProcessingCache::load(&paths.cache_file);
    let info = cache.info();

    report.detail(format!("ledger={}", info.ledger_path.display()));
    report.detail(format!("data_home={}", paths.data_home.display()));
    report.detail(format!("downloads_dir={}", paths.downloads_dir.display()));
    report.detail(format!("output_dir={}", paths.output_dir.display()));
    report.detail(format!("cities_dir={}", paths.cities_dir.display()));
    report.detail(format!("processed_files={}", info.total_processed_files));
    report.detail(format!("processed_cities={}", info.total_processed_cities));
    let years = info
        .available_years
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    report.detail(format!("available_years=[{years}]"));
    report.detail(format!("last_update={}", info.last_update));

    for (key, entry) in &cache.ledger().processed_files {
        report.detail(format!(
            "file {key}: {} records ({})",
            entry.file_info.total_records, entry.processed_at
        ));
    }
    for (key, entry) in &cache.ledger().processed_cities {
        report.detail(format!(
            "city {key}: {} of {} records ({})",
            entry.file_info.filtered_records, entry.file_info.total_records, entry.processed_at
        ));
    }

    Ok(report)
}
