use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChoroplethError {
    #[error("Cannot compute a value range over zero metrics")]
    EmptyInput,

    #[error("Unrecognized format {0}")]
    UnrecognizedFormat(String),

    #[error("Expected a GeoJSON FeatureCollection, found {0}")]
    NotAFeatureCollection(String),

    #[error("TopoJSON object {0} not found")]
    MissingTopojsonObject(String),

    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Invalid TopoJSON: {0}")]
    TopoJson(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Could not fetch {url}: {reason}")]
    Transport { url: String, reason: String },
}
