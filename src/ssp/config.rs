use anyhow::{Result, anyhow};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub force_reprocess: bool,
    /// Years strictly above this are rejected before any acquisition attempt.
    pub max_year: i32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            force_reprocess: false,
            max_year: Utc::now().year(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_radius_km: f64,
    pub earth_radius_km: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 5.0,
            earth_radius_km: 6371.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityMatchConfig {
    pub similarity_threshold: f64,
    pub min_significant_words_ratio: f64,
    pub min_significant_words_count: usize,
}

impl Default for CityMatchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            min_significant_words_ratio: 0.6,
            min_significant_words_count: 2,
        }
    }
}

/// Candidate record keys tried in order; comparison is case-sensitive so
/// `latitude` and `LATITUDE` style sources both resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    pub latitude: Vec<String>,
    pub longitude: Vec<String>,
    pub address: Vec<String>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            latitude: to_strings(&["latitude", "lat", "coordenada_lat", "coord_lat", "LATITUDE"]),
            longitude: to_strings(&[
                "longitude",
                "lon",
                "lng",
                "coordenada_lon",
                "coord_lon",
                "LONGITUDE",
            ]),
            address: to_strings(&["endereco", "logradouro", "rua", "address", "local"]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

fn default_categories() -> BTreeMap<String, String> {
    [
        ("dados_criminais", "Dados Criminais"),
        ("dados_produtividade", "Dados de Produtividade"),
        ("morte_intervencao", "Morte Decorrente de Intervenção Policial"),
        ("celulares_subtraidos", "Celulares subtraídos"),
        ("veiculos_subtraidos", "Veículos subtraídos"),
        ("objetos_subtraidos", "Objetos subtraídos"),
    ]
    .iter()
    .map(|(key, label)| (key.to_string(), label.to_string()))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SspConfig {
    pub cache: CacheConfig,
    pub search: SearchConfig,
    pub city_match: CityMatchConfig,
    pub fields: FieldConfig,
    pub categories: BTreeMap<String, String>,
}

impl Default for SspConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            search: SearchConfig::default(),
            city_match: CityMatchConfig::default(),
            fields: FieldConfig::default(),
            categories: default_categories(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialSspConfig {
    cache: Option<CacheConfig>,
    search: Option<SearchConfig>,
    city_match: Option<CityMatchConfig>,
    fields: Option<FieldConfig>,
    categories: Option<BTreeMap<String, String>>,
}

fn env_or_f64(var: &str, fallback: f64) -> f64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<f64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_i32(var: &str, fallback: i32) -> i32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<i32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => {
            let trimmed = v.trim();
            match trimmed {
                "1" | "true" | "TRUE" | "yes" | "on" => true,
                "0" | "false" | "FALSE" | "no" | "off" => false,
                _ => fallback,
            }
        }
        Err(_) => fallback,
    }
}

fn validate(cfg: &SspConfig) -> Result<()> {
    let s = cfg.city_match.similarity_threshold;
    if !(s > 0.0 && s <= 1.0) {
        return Err(anyhow!(
            "invalid city similarity threshold: require 0 < threshold <= 1.0"
        ));
    }
    let r = cfg.city_match.min_significant_words_ratio;
    if !(r > 0.0 && r <= 1.0) {
        return Err(anyhow!(
            "invalid significant words ratio: require 0 < ratio <= 1.0"
        ));
    }
    if cfg.city_match.min_significant_words_count == 0 {
        return Err(anyhow!("invalid significant words count: must be >= 1"));
    }
    if cfg.search.default_radius_km <= 0.0 {
        return Err(anyhow!("invalid default radius: must be > 0 km"));
    }
    if cfg.search.earth_radius_km <= 0.0 {
        return Err(anyhow!("invalid earth radius: must be > 0 km"));
    }
    if cfg.cache.max_year <= 0 {
        return Err(anyhow!("invalid max year: must be > 0"));
    }
    if cfg.fields.latitude.is_empty() || cfg.fields.longitude.is_empty() {
        return Err(anyhow!("coordinate field lists cannot be empty"));
    }
    if cfg.fields.address.is_empty() {
        return Err(anyhow!("address field list cannot be empty"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("SSP_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    if let Ok(home) = env::var("SSP_HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed).join("ssp.toml"));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join("ssp-data").join("ssp.toml"))
}

fn merge_file_config(base: &mut SspConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialSspConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse ssp config {}: {err}", path.display()))?;
    if let Some(cache) = parsed.cache {
        base.cache = cache;
    }
    if let Some(search) = parsed.search {
        base.search = search;
    }
    if let Some(city_match) = parsed.city_match {
        base.city_match = city_match;
    }
    if let Some(fields) = parsed.fields {
        base.fields = fields;
    }
    if let Some(categories) = parsed.categories {
        base.categories = categories;
    }
    Ok(())
}

pub fn load_config() -> Result<SspConfig> {
    let mut cfg = SspConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.cache.enabled = env_or_bool("SSP_CACHE_ENABLED", cfg.cache.enabled);
    cfg.cache.force_reprocess = env_or_bool("SSP_FORCE_REPROCESS", cfg.cache.force_reprocess);
    cfg.cache.max_year = env_or_i32("SSP_MAX_YEAR", cfg.cache.max_year);
    cfg.search.default_radius_km =
        env_or_f64("SSP_DEFAULT_RADIUS_KM", cfg.search.default_radius_km);
    cfg.search.earth_radius_km = env_or_f64("SSP_EARTH_RADIUS_KM", cfg.search.earth_radius_km);
    cfg.city_match.similarity_threshold = env_or_f64(
        "SSP_CITY_SIMILARITY_THRESHOLD",
        cfg.city_match.similarity_threshold,
    );
    cfg.city_match.min_significant_words_ratio = env_or_f64(
        "SSP_MIN_SIGNIFICANT_WORDS_RATIO",
        cfg.city_match.min_significant_words_ratio,
    );
    cfg.city_match.min_significant_words_count = env_or_usize(
        "SSP_MIN_SIGNIFICANT_WORDS_COUNT",
        cfg.city_match.min_significant_words_count,
    );

    validate(&cfg)?;
    Ok(cfg)
}
