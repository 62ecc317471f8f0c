//! I/O layer: GDAL-backed raster readers and CRS transforms, the MODIS and
//! SIF sources, the region gazetteer, and `writers` for GeoTIFF exports.
pub mod gdal;
pub use gdal::{GdalCrsTransform, GdalError, GdalRasterReader, RasterMetadata};

pub mod modis;
pub use modis::{ImageSource, ModisArchive};

pub mod region;
pub use region::{Bounds, Gazetteer, GeoJsonGazetteer, Region};

pub mod sif;
pub use sif::{SifAssetStore, SifSource};

pub mod writers;
