use crate::ssp::city_match;
use crate::ssp::config::CityMatchConfig;
use crate::ssp::store::IncidentRecord;
use serde_json::{Map, Value};

/// Key fragments that mark a field as city-bearing.
const CITY_FIELD_HINTS: [&str; 5] = ["cidade", "municipio", "município", "city", "local"];

fn is_city_field(key: &str) -> bool {
    let lowered = key.to_lowercase();
    CITY_FIELD_HINTS.iter().any(|hint| lowered.contains(hint))
}

fn record_matches_city(record: &Map<String, Value>, city: &str, cfg: &CityMatchConfig) -> bool {
    record.iter().any(|(key, value)| {
        is_city_field(key)
            && value
                .as_str()
                .is_some_and(|v| city_match::matches(v, city, cfg))
    })
}

#[derive(Debug)]
pub struct CityFilterOutcome {
    pub records: Vec<IncidentRecord>,
    pub total_records: u64,
    pub filtered_records: u64,
    pub had_city_fields: bool,
}

/// Retain the records whose city value designates `city`. When no record
/// carries a city-bearing field there is nothing to filter on; the full set
/// is kept and callers surface a warning.
pub fn filter_by_city(
    records: &[IncidentRecord],
    city: &str,
    cfg: &CityMatchConfig,
) -> CityFilterOutcome {
    let total_records = records.len() as u64;
    let had_city_fields = records
        .iter()
        .any(|record| record.raw.keys().any(|key| is_city_field(key)));

    if !had_city_fields {
        return CityFilterOutcome {
            records: records.to_vec(),
            total_records,
            filtered_records: total_records,
            had_city_fields: false,
        };
    }

    let kept: Vec<IncidentRecord> = records
        .iter()
        .filter(|record| record_matches_city(&record.raw, city, cfg))
        .cloned()
        .collect();

    CityFilterOutcome {
        filtered_records: kept.len() as u64,
        records: kept,
        total_records,
        had_city_fields: true,
    }
}
