use crate::commands::CommandReport;
use crate::ssp::audit;
use crate::ssp::cache::ProcessingCache;
use crate::ssp::paths::resolve_paths;
use anyhow::Result;

pub fn run(yes: bool) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("cache-clear");

    if !yes {
        report.issue("cache-clear is irreversible; pass --yes to confirm");
        return Ok(report);
    }

    let mut cache = ProcessingCache::load(&paths.cache_file);
    cache.clear()?;
    audit::append_event(&paths, "cache-clear", "ok", "ledger reset to empty")?;
    report.detail("cache ledger cleared");
    Ok(report)
}
