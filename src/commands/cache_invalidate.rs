use crate::commands::CommandReport;
use crate::ssp::audit;
use crate::ssp::cache::ProcessingCache;
use crate::ssp::paths::resolve_paths;
use anyhow::Result;

pub fn run(category: &str, year: i32, city: Option<&str>) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("cache-invalidate");

    let mut cache = ProcessingCache::load(&paths.cache_file);
    let removed = cache.force_reprocess(category, year, city)?;

    if removed == 0 {
        report.detail("no matching cache entries");
        return Ok(report);
    }

    let scope = match city {
        Some(city) => format!("{category}_{year} city={city}"),
        None => format!("{category}_{year}"),
    };
    audit::append_event(
        &paths,
        "cache-invalidate",
        "ok",
        &format!("{scope} removed={removed}"),
    )?;
    report.detail(format!(
        "removed {removed} cache entries for {scope}; artifacts on disk are untouched"
    ));
    Ok(report)
}
