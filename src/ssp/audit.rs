use crate::ssp::paths::SspPaths;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at: String,
    pub operation: String,
    pub outcome: String,
    pub detail: String,
}

pub fn append_event(paths: &SspPaths, operation: &str, outcome: &str, detail: &str) -> Result<()> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let event = AuditEvent {
        at: Utc::now().to_rfc3339(),
        operation: operation.to_string(),
        outcome: outcome.to_string(),
        detail: detail.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    use std::io::Write;
    let path = paths.logs_dir.join("audit.log");
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}
