use thiserror::Error;

#[derive(Debug, Error)]
pub enum SspError {
    #[error("year {year} is in the future (current year: {current})")]
    FutureYear { year: i32, current: i32 },
    #[error("city '{city}' cannot be marked processed before {category}_{year} is processed")]
    InvalidState {
        category: String,
        year: i32,
        city: String,
    },
    #[error("invalid coordinate literal: {0}")]
    InvalidCoordinate(String),
    #[error("query could not be resolved to a coordinate: {0}")]
    GeocodeNotFound(String),
    #[error("no artifact on disk for {category}_{year}")]
    MissingArtifact { category: String, year: i32 },
}
