use crate::error::SspError;
use crate::ssp::config::FieldConfig;
use crate::ssp::geo::{self, Coordinate};
use crate::ssp::store::LoadedArtifact;
use serde_json::Value;

/// Address-to-coordinate resolution is an external capability; anything that
/// can turn free text into a coordinate plugs in here.
pub trait Geocoder {
    fn resolve(&self, query: &str) -> Result<Coordinate, SspError>;
}

fn parse_literal(query: &str) -> Option<(f64, f64)> {
    let (lat_raw, lon_raw) = query.split_once(',')?;
    let lat = lat_raw.trim().parse::<f64>().ok()?;
    let lon = lon_raw.trim().parse::<f64>().ok()?;
    Some((lat, lon))
}

/// Resolve a query string to a coordinate. A `"<lat>,<lon>"` literal is
/// parsed directly; a literal with non-finite or out-of-range components
/// fails with `InvalidCoordinate` instead of falling through to geocoding.
/// Anything else is treated as free text and delegated.
pub fn resolve_query(query: &str, geocoder: &dyn Geocoder) -> Result<Coordinate, SspError> {
    let trimmed = query.trim();
    if let Some((lat, lon)) = parse_literal(trimmed) {
        return Coordinate::new(lat, lon);
    }
    geocoder.resolve(trimmed)
}

/// Resolves a street or address fragment against the already loaded
/// artifacts: the first record whose address fields contain the query
/// (case-insensitive) and that carries a usable coordinate pair wins.
pub struct DatasetGeocoder<'a> {
    pub artifacts: &'a [LoadedArtifact],
    pub fields: &'a FieldConfig,
}

impl Geocoder for DatasetGeocoder<'_> {
    fn resolve(&self, query: &str) -> Result<Coordinate, SspError> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Err(SspError::GeocodeNotFound(query.to_string()));
        }

        for artifact in self.artifacts {
            for record in &artifact.records {
                let hit = self.fields.address.iter().any(|key| {
                    record
                        .raw
                        .get(key)
                        .and_then(Value::as_str)
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
                });
                if hit && let Some(coord) = geo::extract_coordinates(&record.raw, self.fields) {
                    return Ok(coord);
                }
            }
        }

        Err(SspError::GeocodeNotFound(query.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssp::store::IncidentRecord;
    use serde_json::json;

    struct NoGeocoder;

    impl Geocoder for NoGeocoder {
        fn resolve(&self, query: &str) -> Result<Coordinate, SspError> {
            Err(SspError::GeocodeNotFound(query.to_string()))
        }
    }

    fn artifact_with(records: Vec<serde_json::Value>) -> LoadedArtifact {
        LoadedArtifact {
            category: "dados_criminais".to_string(),
            year: 2023,
            records: records
                .into_iter()
                .map(|r| IncidentRecord {
                    category: "dados_criminais".to_string(),
                    raw: r.as_object().expect("object").clone(),
                })
                .collect(),
            skipped_records: 0,
        }
    }

    #[test]
    fn literal_coordinates_parse_directly() {
        let got = resolve_query("-23.5505, -46.6333", &NoGeocoder).expect("coordinate");
        assert_eq!(got.latitude, -23.5505);
        assert_eq!(got.longitude, -46.6333);
    }

    #[test]
    fn out_of_range_literal_is_invalid_not_geocoded() {
        let err = resolve_query("95.0,-46.6", &NoGeocoder).expect_err("invalid");
        assert!(matches!(err, SspError::InvalidCoordinate(_)));
    }

    #[test]
    fn non_finite_literal_is_invalid() {
        let err = resolve_query("inf,0", &NoGeocoder).expect_err("invalid");
        assert!(matches!(err, SspError::InvalidCoordinate(_)));
    }

    #[test]
    fn free_text_falls_through_to_the_geocoder() {
        let err = resolve_query("Avenida Paulista", &NoGeocoder).expect_err("not found");
        assert!(matches!(err, SspError::GeocodeNotFound(_)));
    }

    #[test]
    fn dataset_geocoder_finds_street_names() {
        let artifacts = vec![artifact_with(vec![
            json!({ "endereco": "Rua XV de Novembro, 100" }),
            json!({
                "endereco": "Avenida Paulista, 1578",
                "latitude": -23.5614,
                "longitude": -46.6559,
            }),
        ])];
        let geocoder = DatasetGeocoder {
            artifacts: &artifacts,
            fields: &FieldConfig::default(),
        };

        let got = geocoder.resolve("avenida paulista").expect("coordinate");
        assert_eq!(got.latitude, -23.5614);
    }

    #[test]
    fn dataset_geocoder_skips_hits_without_coordinates() {
        let artifacts = vec![artifact_with(vec![json!({
            "endereco": "Avenida Paulista, 1578",
        })])];
        let geocoder = DatasetGeocoder {
            artifacts: &artifacts,
            fields: &FieldConfig::default(),
        };

        let err = geocoder.resolve("avenida paulista").expect_err("not found");
        assert!(matches!(err, SspError::GeocodeNotFound(_)));
    }
}
