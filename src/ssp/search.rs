use crate::ssp::config::SspConfig;
use crate::ssp::geo::{self, Coordinate};
use crate::ssp::resolve::{self, DatasetGeocoder};
use crate::ssp::store::{self, LoadedArtifact};
use crate::ssp::warn;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct GeoMatch {
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub raw: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub radius_km: f64,
    pub total_records_scanned: u64,
    pub skipped_records: u64,
    /// Ascending by distance; ties break on category name, then original
    /// record order.
    pub matches: Vec<GeoMatch>,
    pub stats_by_category: BTreeMap<String, u64>,
    pub generated_at: String,
}

fn load_available(
    output_dir: &Path,
    categories: Option<&BTreeSet<String>>,
) -> Result<Vec<LoadedArtifact>> {
    let refs = store::available_artifacts(output_dir)?;
    let mut artifacts = Vec::new();
    for artifact_ref in &refs {
        if let Some(wanted) = categories
            && !wanted.contains(&artifact_ref.category)
        {
            continue;
        }
        match store::load_artifact(artifact_ref) {
            Ok(loaded) => artifacts.push(loaded),
            Err(err) => warn::emit(
                "ARTIFACT_UNREADABLE",
                "search",
                &artifact_ref.path.display().to_string(),
                "skipped",
                &format!("{err:#}"),
            ),
        }
    }
    Ok(artifacts)
}

fn scan(
    artifacts: &[LoadedArtifact],
    center: Coordinate,
    radius_km: f64,
    cfg: &SspConfig,
) -> (Vec<GeoMatch>, u64, u64) {
    let mut matches = Vec::new();
    let mut total_records_scanned = 0u64;
    let mut skipped_records = 0u64;

    for artifact in artifacts {
        total_records_scanned += artifact.records.len() as u64 + artifact.skipped_records;
        skipped_records += artifact.skipped_records;

        for record in &artifact.records {
            let Some(coord) = geo::extract_coordinates(&record.raw, &cfg.fields) else {
                continue;
            };
            let distance_km = geo::distance_km(center, coord, cfg.search.earth_radius_km);
            if distance_km <= radius_km {
                matches.push(GeoMatch {
                    category: record.category.clone(),
                    latitude: coord.latitude,
                    longitude: coord.longitude,
                    distance_km,
                    raw: record.raw.clone(),
                });
            }
        }
    }

    matches.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.category.cmp(&b.category))
    });

    (matches, total_records_scanned, skipped_records)
}

/// Answer a radius query across every available artifact. The coordinate is
/// a hard prerequisite: resolution failures abort the query. Malformed
/// records and unreadable artifacts are skipped and counted, never fatal.
/// Zero matches is a valid result.
pub fn search(
    output_dir: &Path,
    cfg: &SspConfig,
    query: &str,
    radius_km: f64,
    categories: Option<&BTreeSet<String>>,
) -> Result<SearchResult> {
    let artifacts = load_available(output_dir, categories)?;

    let geocoder = DatasetGeocoder {
        artifacts: &artifacts,
        fields: &cfg.fields,
    };
    let center = resolve::resolve_query(query, &geocoder)?;

    let (matches, total_records_scanned, skipped_records) =
        scan(&artifacts, center, radius_km, cfg);

    let mut stats_by_category = BTreeMap::new();
    for m in &matches {
        *stats_by_category.entry(m.category.clone()).or_insert(0u64) += 1;
    }

    Ok(SearchResult {
        query: query.to_string(),
        radius_km,
        total_records_scanned,
        skipped_records,
        matches,
        stats_by_category,
        generated_at: Utc::now().to_rfc3339(),
    })
}

/// Write the full result set to a JSON file in the output dir, named after
/// the query unless a name is supplied.
pub fn export_detailed_results(
    output_dir: &Path,
    result: &SearchResult,
    output_file: Option<&str>,
) -> Result<PathBuf> {
    let filename = match output_file {
        Some(name) => name.to_string(),
        None => {
            let stamp = Utc::now().format("%Y%m%d_%H%M%S");
            let query_slug = result.query.replace([',', ' '], "_");
            format!(
                "analise_detalhada_{query_slug}_{}km_{stamp}.json",
                result.radius_km
            )
        }
    };

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let path = output_dir.join(filename);
    let payload = serde_json::to_string_pretty(result)?;
    fs::write(&path, format!("{payload}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
