use crate::error::SspError;
use crate::ssp::config::FieldConfig;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SspError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(SspError::InvalidCoordinate(format!(
                "{latitude},{longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Great-circle distance in kilometers, haversine formula.
pub fn distance_km(a: Coordinate, b: Coordinate, earth_radius_km: f64) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * earth_radius_km * h.sqrt().min(1.0).asin()
}

fn field_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // loosely formatted sources carry numbers as strings
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Extract a coordinate pair from a raw record. Candidate keys are tried in
/// order, first parseable match wins; key comparison is case-sensitive.
/// Records without a resolvable pair stay out of spatial search but still
/// count toward scan totals.
pub fn extract_coordinates(record: &Map<String, Value>, fields: &FieldConfig) -> Option<Coordinate> {
    let lat = fields
        .latitude
        .iter()
        .find_map(|key| record.get(key).and_then(field_as_f64))?;
    let lon = fields
        .longitude
        .iter()
        .find_map(|key| record.get(key).and_then(field_as_f64))?;
    Coordinate::new(lat, lon).ok()
}

pub fn extract_address(record: &Map<String, Value>, fields: &FieldConfig) -> Option<String> {
    fields.address.iter().find_map(|key| {
        record
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
    })
}

pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{:.0}m", distance_km * 1000.0)
    } else {
        format!("{distance_km:.2}km")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssp::config::FieldConfig;
    use serde_json::json;

    const EARTH_RADIUS_KM: f64 = 6371.0;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    fn record(fields: serde_json::Value) -> Map<String, Value> {
        fields.as_object().expect("object").clone()
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        let sp = coord(-23.5505, -46.6333);
        assert_eq!(distance_km(sp, sp, EARTH_RADIUS_KM), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (coord(-23.5505, -46.6333), coord(-22.9068, -43.1729)),
            (coord(0.0, 0.0), coord(10.0, 10.0)),
            (coord(89.0, 179.0), coord(-89.0, -179.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(
                distance_km(a, b, EARTH_RADIUS_KM),
                distance_km(b, a, EARTH_RADIUS_KM)
            );
        }
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_km(coord(0.0, 0.0), coord(1.0, 0.0), EARTH_RADIUS_KM);
        assert!((d - 111.19).abs() / 111.19 < 0.01, "got {d}");
    }

    #[test]
    fn extraction_honors_candidate_priority() {
        let rec = record(json!({
            "lat": -20.0,
            "latitude": -23.5505,
            "longitude": -46.6333,
        }));
        let got = extract_coordinates(&rec, &FieldConfig::default()).expect("coordinate");
        assert_eq!(got.latitude, -23.5505);
    }

    #[test]
    fn extraction_supports_upper_case_variants() {
        let rec = record(json!({
            "LATITUDE": "-23.5505",
            "LONGITUDE": "-46.6333",
        }));
        let got = extract_coordinates(&rec, &FieldConfig::default()).expect("coordinate");
        assert_eq!(got.longitude, -46.6333);
    }

    #[test]
    fn extraction_is_case_sensitive_per_candidate() {
        let rec = record(json!({
            "Latitude": -23.5505,
            "Longitude": -46.6333,
        }));
        assert!(extract_coordinates(&rec, &FieldConfig::default()).is_none());
    }

    #[test]
    fn unparseable_candidate_falls_through_to_the_next() {
        let rec = record(json!({
            "latitude": "n/a",
            "lat": -23.5505,
            "longitude": -46.6333,
        }));
        let got = extract_coordinates(&rec, &FieldConfig::default()).expect("coordinate");
        assert_eq!(got.latitude, -23.5505);
    }

    #[test]
    fn out_of_range_pair_is_rejected() {
        assert!(Coordinate::new(-91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, 181.0).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn short_distances_format_in_meters() {
        assert_eq!(format_distance(0.85), "850m");
        assert_eq!(format_distance(2.5), "2.50km");
    }
}
