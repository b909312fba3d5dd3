use crate::error::SspError;
use crate::ssp::warn;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LEDGER_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub total_records: u64,
    /// `"ALL"` for an unfiltered category/year download.
    pub city_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub category: String,
    pub year: i32,
    pub processed_at: String,
    pub file_info: FileInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityFileInfo {
    pub filtered_records: u64,
    pub total_records: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityEntry {
    pub category: String,
    pub year: i32,
    pub city: String,
    pub processed_at: String,
    pub file_info: CityFileInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheLedger {
    pub processed_files: BTreeMap<String, FileEntry>,
    pub processed_cities: BTreeMap<String, CityEntry>,
    /// Union of all years ever recorded in `processed_files`; invalidation
    /// does not shrink it.
    pub available_years: BTreeSet<i32>,
    pub last_update: String,
    pub version: String,
}

impl CacheLedger {
    fn fresh() -> Self {
        Self {
            version: LEDGER_VERSION.to_string(),
            last_update: Utc::now().to_rfc3339(),
            ..Self::default()
        }
    }
}

pub fn file_key(category: &str, year: i32) -> String {
    format!("{category}_{year}")
}

/// City comparison for cache keys is case-insensitive and
/// whitespace-normalized exact match; fuzzy matching happens only at
/// query time, never here.
fn city_key_component(city: &str) -> String {
    city.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn city_key(category: &str, year: i32, city: &str) -> String {
    format!("{category}_{year}_{}", city_key_component(city))
}

pub fn ensure_year_allowed(year: i32, max_year: i32) -> Result<(), SspError> {
    if year > max_year {
        return Err(SspError::FutureYear {
            year,
            current: max_year,
        });
    }
    Ok(())
}

pub fn validate_year(year: i32, max_year: i32) -> bool {
    ensure_year_allowed(year, max_year).is_ok()
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub total_processed_files: usize,
    pub total_processed_cities: usize,
    pub available_years: Vec<i32>,
    pub last_update: String,
    pub ledger_path: PathBuf,
}

#[derive(Debug)]
pub struct ProcessingCache {
    path: PathBuf,
    data: CacheLedger,
}

impl ProcessingCache {
    /// Load the ledger from disk. A corrupt or unreadable file degrades to
    /// an empty ledger with a warning; the system can always proceed by
    /// re-downloading. Orphaned city entries are dropped on load.
    pub fn load(path: &Path) -> Self {
        let mut data = if path.exists() {
            match fs::read_to_string(path) {
                Ok(raw) => match serde_json::from_str::<CacheLedger>(&raw) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        warn::emit(
                            "CACHE_CORRUPT",
                            "ledger-load",
                            &path.display().to_string(),
                            "invalid json, starting empty",
                            &err.to_string(),
                        );
                        CacheLedger::fresh()
                    }
                },
                Err(err) => {
                    warn::emit(
                        "CACHE_CORRUPT",
                        "ledger-load",
                        &path.display().to_string(),
                        "unreadable, starting empty",
                        &err.to_string(),
                    );
                    CacheLedger::fresh()
                }
            }
        } else {
            CacheLedger::fresh()
        };

        if data.version.trim().is_empty() {
            data.version = LEDGER_VERSION.to_string();
        }
        Self::repair_orphans(&mut data);

        Self {
            path: path.to_path_buf(),
            data,
        }
    }

    /// A city cannot have been filtered from a file that was never fully
    /// downloaded; such entries are inconsistent and get dropped.
    fn repair_orphans(data: &mut CacheLedger) {
        let orphaned: Vec<String> = data
            .processed_cities
            .iter()
            .filter(|(_, entry)| {
                !data
                    .processed_files
                    .contains_key(&file_key(&entry.category, entry.year))
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in orphaned {
            warn::emit(
                "CACHE_ORPHAN",
                "ledger-load",
                &key,
                "city entry without file entry, dropped",
                "",
            );
            data.processed_cities.remove(&key);
        }
    }

    /// Write-to-temp-then-rename so a crash mid-write never leaves a
    /// truncated ledger visible to the next reader.
    fn persist(&mut self) -> Result<()> {
        self.data.last_update = Utc::now().to_rfc3339();

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
                parent.to_path_buf()
            }
            _ => PathBuf::from("."),
        };

        let payload = serde_json::to_string_pretty(&self.data)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("failed to stage ledger write in {}", dir.display()))?;
        tmp.write_all(payload.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    pub fn is_file_processed(&self, category: &str, year: i32) -> bool {
        self.data
            .processed_files
            .contains_key(&file_key(category, year))
    }

    pub fn mark_file_processed(
        &mut self,
        category: &str,
        year: i32,
        file_info: FileInfo,
    ) -> Result<()> {
        let entry = FileEntry {
            category: category.to_string(),
            year,
            processed_at: Utc::now().to_rfc3339(),
            file_info,
        };
        self.data
            .processed_files
            .insert(file_key(category, year), entry);
        self.data.available_years.insert(year);
        self.persist()
    }

    pub fn is_city_processed(&self, category: &str, year: i32, city: &str) -> bool {
        self.data
            .processed_cities
            .contains_key(&city_key(category, year, city))
    }

    pub fn mark_city_processed(
        &mut self,
        category: &str,
        year: i32,
        city: &str,
        file_info: CityFileInfo,
    ) -> Result<()> {
        if !self.is_file_processed(category, year) {
            return Err(SspError::InvalidState {
                category: category.to_string(),
                year,
                city: city.to_string(),
            }
            .into());
        }

        let entry = CityEntry {
            category: category.to_string(),
            year,
            city: city.to_string(),
            processed_at: Utc::now().to_rfc3339(),
            file_info,
        };
        self.data
            .processed_cities
            .insert(city_key(category, year, city), entry);
        self.persist()
    }

    /// Drop cache entries so the work is redone on the next run. The
    /// underlying artifacts stay on disk. Removing a file entry cascades to
    /// its city entries, which could not outlive it across a reload anyway.
    pub fn force_reprocess(
        &mut self,
        category: &str,
        year: i32,
        city: Option<&str>,
    ) -> Result<usize> {
        let removed = match city {
            Some(city) => usize::from(
                self.data
                    .processed_cities
                    .remove(&city_key(category, year, city))
                    .is_some(),
            ),
            None => {
                let mut removed = usize::from(
                    self.data
                        .processed_files
                        .remove(&file_key(category, year))
                        .is_some(),
                );
                let before = self.data.processed_cities.len();
                self.data
                    .processed_cities
                    .retain(|_, entry| !(entry.category == category && entry.year == year));
                removed += before - self.data.processed_cities.len();
                removed
            }
        };

        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Destructive and irreversible; confirmation policy belongs to callers.
    pub fn clear(&mut self) -> Result<()> {
        self.data = CacheLedger::fresh();
        self.persist()
    }

    pub fn info(&self) -> CacheInfo {
        CacheInfo {
            total_processed_files: self.data.processed_files.len(),
            total_processed_cities: self.data.processed_cities.len(),
            available_years: self.data.available_years.iter().copied().collect(),
            last_update: self.data.last_update.clone(),
            ledger_path: self.path.clone(),
        }
    }

    pub fn ledger(&self) -> &CacheLedger {
        &self.data
    }
}
