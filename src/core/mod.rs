//! Core building blocks: the raster model, run configuration and the
//! processing steps (index, composite, ratio, reconstruction, resampling).
//! These are consumed by the high-level `api` module.
pub mod params;
pub mod processing;
pub mod raster;
