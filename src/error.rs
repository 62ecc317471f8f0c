//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, JSON, and GDAL errors, and provides semantic variants
//! for lookups, raster shape checks, and export submission failures.
use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Region not found in gazetteer: {name}")]
    RegionNotFound { name: String },

    #[error("Region {name} has an empty geometry; export would cover zero area")]
    EmptyRegion { name: String },

    #[error("Missing SIF asset: {path}")]
    MissingAsset { path: String },

    #[error("Band {band} not found in image {image}")]
    MissingBand { band: String, image: String },

    #[error("Band {band} already exists in image {image}")]
    DuplicateBand { band: String, image: String },

    #[error("Dimension mismatch: expected {expected:?}, got {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Images are not on a common grid: {0}")]
    GridMismatch(String),

    #[error("No images in window [{start}, {end}) for date {date}")]
    EmptyWindow {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Export of {pixels} pixels exceeds the budget of {max}")]
    PixelBudgetExceeded { pixels: u64, max: u64 },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Processing error: {0}")]
    Processing(String),
}
