use crate::error::SspError;
use crate::ssp::paths::SspPaths;
use crate::ssp::warn;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// One on-disk artifact: all records for a category and year.
#[derive(Debug, Clone)]
pub struct ArtifactRef {
    pub category: String,
    pub year: i32,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct IncidentRecord {
    pub category: String,
    pub raw: Map<String, Value>,
}

#[derive(Debug)]
pub struct LoadedArtifact {
    pub category: String,
    pub year: i32,
    pub records: Vec<IncidentRecord>,
    /// Entries under "dados" that were not JSON objects.
    pub skipped_records: u64,
}

fn artifact_ref_from_path(path: &Path) -> Option<ArtifactRef> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (category, year_raw) = stem.rsplit_once('_')?;
    let year = year_raw.parse::<i32>().ok()?;
    if category.is_empty() {
        return None;
    }
    Some(ArtifactRef {
        category: category.to_string(),
        year,
        path: path.to_path_buf(),
    })
}

/// Every `<category>_<year>.json` artifact in the output dir, sorted by
/// category then year. Files whose names do not fit the pattern are ignored.
pub fn available_artifacts(output_dir: &Path) -> Result<Vec<ArtifactRef>> {
    if !output_dir.exists() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    let read_dir = fs::read_dir(output_dir)
        .with_context(|| format!("failed to read {}", output_dir.display()))?;
    for entry in read_dir {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(artifact) = artifact_ref_from_path(&path) {
            out.push(artifact);
        }
    }

    out.sort_by(|a, b| a.category.cmp(&b.category).then(a.year.cmp(&b.year)));
    Ok(out)
}

pub fn require_artifact(
    output_dir: &Path,
    category: &str,
    year: i32,
) -> Result<ArtifactRef, SspError> {
    let path = output_dir.join(format!("{category}_{year}.json"));
    if !path.exists() {
        return Err(SspError::MissingArtifact {
            category: category.to_string(),
            year,
        });
    }
    Ok(ArtifactRef {
        category: category.to_string(),
        year,
        path,
    })
}

pub fn load_artifact(artifact: &ArtifactRef) -> Result<LoadedArtifact> {
    let raw = fs::read_to_string(&artifact.path)
        .with_context(|| format!("failed to read {}", artifact.path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", artifact.path.display()))?;

    let category = value
        .get("categoria")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| artifact.category.clone());

    let mut records = Vec::new();
    let mut skipped_records = 0u64;
    let dados = value
        .get("dados")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for item in dados {
        match item {
            Value::Object(map) => records.push(IncidentRecord {
                category: category.clone(),
                raw: map,
            }),
            _ => skipped_records += 1,
        }
    }

    if skipped_records > 0 {
        warn::emit(
            "RECORD_SKIPPED",
            "artifact-load",
            &artifact.path.display().to_string(),
            "non-object entries under dados",
            &skipped_records.to_string(),
        );
    }

    Ok(LoadedArtifact {
        category,
        year: artifact.year,
        records,
        skipped_records,
    })
}

/// File-name-safe rendition of a city name, matching the layout the
/// per-city artifacts are written under.
pub fn city_slug(city: &str) -> String {
    city.replace(' ', "_").replace(['.', ','], "")
}

pub fn city_artifact_path(paths: &SspPaths, category: &str, year: i32, city: &str) -> PathBuf {
    paths
        .cities_dir
        .join(format!("{category}_{year}_{}.json", city_slug(city)))
}

/// Load the per-city filtered sibling of an artifact, if it exists.
pub fn load_city_artifact(
    paths: &SspPaths,
    category: &str,
    year: i32,
    city: &str,
) -> Result<Option<LoadedArtifact>> {
    let path = city_artifact_path(paths, category, year, city);
    if !path.exists() {
        return Ok(None);
    }
    let artifact = ArtifactRef {
        category: category.to_string(),
        year,
        path,
    };
    Ok(Some(load_artifact(&artifact)?))
}

pub fn write_artifact(path: &Path, payload: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(payload)?;
    fs::write(path, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn artifact_names_parse_category_and_year() {
        let got = artifact_ref_from_path(Path::new("/out/dados_criminais_2023.json"))
            .expect("artifact ref");
        assert_eq!(got.category, "dados_criminais");
        assert_eq!(got.year, 2023);

        assert!(artifact_ref_from_path(Path::new("/out/notes.txt")).is_none());
        assert!(artifact_ref_from_path(Path::new("/out/readme.json")).is_none());
    }

    #[test]
    fn available_artifacts_sorts_and_skips_foreign_files() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join("veiculos_subtraidos_2024.json"), "{}").expect("write");
        fs::write(tmp.path().join("dados_criminais_2023.json"), "{}").expect("write");
        fs::write(tmp.path().join("dados_criminais_2022.json"), "{}").expect("write");
        fs::write(tmp.path().join("notas.txt"), "ignored").expect("write");

        let got = available_artifacts(tmp.path()).expect("list");
        let keys: Vec<String> = got
            .iter()
            .map(|a| format!("{}_{}", a.category, a.year))
            .collect();
        assert_eq!(
            keys,
            vec![
                "dados_criminais_2022",
                "dados_criminais_2023",
                "veiculos_subtraidos_2024",
            ]
        );
    }

    #[test]
    fn load_artifact_counts_non_object_entries() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("dados_criminais_2023.json");
        let payload = json!({
            "categoria": "Dados Criminais",
            "dados": [
                { "latitude": -23.5, "longitude": -46.6 },
                "corrupted line",
                17,
            ],
        });
        fs::write(&path, payload.to_string()).expect("write");

        let artifact = require_artifact(tmp.path(), "dados_criminais", 2023).expect("require");
        let loaded = load_artifact(&artifact).expect("load");
        assert_eq!(loaded.category, "Dados Criminais");
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.skipped_records, 2);
    }

    #[test]
    fn missing_artifact_is_a_typed_error() {
        let tmp = tempdir().expect("tempdir");
        let err = require_artifact(tmp.path(), "dados_criminais", 2023)
            .expect_err("missing artifact");
        assert!(matches!(err, SspError::MissingArtifact { year: 2023, .. }));
    }

    #[test]
    fn city_slug_strips_separators() {
        assert_eq!(city_slug("São José dos Campos"), "São_José_dos_Campos");
        assert_eq!(city_slug("S. José, Campos"), "S_José_Campos");
    }
}
