//! Output writers: Float32 GeoTIFFs, provenance metadata and the export sinks.
pub mod export;
pub mod metadata;
pub mod tiff;
