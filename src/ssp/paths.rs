use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SspPaths {
    pub data_home: PathBuf,
    pub downloads_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cities_dir: PathBuf,
    pub cache_file: PathBuf,
    pub logs_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<SspPaths> {
    let home = required_home_dir()?;
    let data_home = env_or_default_path("SSP_HOME", home.join("ssp-data"));

    let downloads_dir = env_or_default_path("SSP_DOWNLOADS_DIR", data_home.join("downloads"));
    let output_dir = env_or_default_path("SSP_OUTPUT_DIR", data_home.join("output"));
    let cities_dir = env_or_default_path("SSP_CITIES_DIR", output_dir.join("cities"));
    let cache_file = env_or_default_path("SSP_CACHE_FILE", data_home.join("cache_config.json"));
    let logs_dir = env_or_default_path("SSP_LOGS_DIR", data_home.join("logs"));

    Ok(SspPaths {
        data_home,
        downloads_dir,
        output_dir,
        cities_dir,
        cache_file,
        logs_dir,
    })
}
