use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::raster::Grid;
use crate::io::region::Bounds;
use crate::types::ResampleKind;

/// Provenance written next to every exported raster
#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    pub description: String,
    pub date: Option<String>,
    pub folder: String,
    pub region: String,
    pub region_bounds: Option<Bounds>,
    pub crs: String,
    pub scale: f64,
    pub geotransform: [f64; 6],
    pub width: usize,
    pub height: usize,
    pub valid_pixels: usize,
    pub resample: ResampleKind,
    pub conversion_tool: String,
    pub conversion_version: String,
    pub conversion_timestamp: String,
}

impl ExportMetadata {
    /// Items embedded in the GeoTIFF's default metadata domain
    pub fn tiff_items(&self) -> Vec<(&'static str, String)> {
        let mut items = vec![
            ("DESCRIPTION", self.description.clone()),
            ("REGION", self.region.clone()),
            ("SCALE", self.scale.to_string()),
            ("RESAMPLE", self.resample.to_string()),
            ("CONVERSION_TOOL", self.conversion_tool.clone()),
            ("CONVERSION_VERSION", self.conversion_version.clone()),
            ("CONVERSION_TIMESTAMP", self.conversion_timestamp.clone()),
        ];
        if let Some(date) = &self.date {
            items.push(("SIF_DATE", date.clone()));
        }
        items
    }
}

/// Fill provenance fields for an output grid
pub fn export_metadata(
    description: &str,
    date: Option<String>,
    folder: &str,
    region: &str,
    region_bounds: Option<Bounds>,
    scale: f64,
    grid: &Grid,
    valid_pixels: usize,
    resample: ResampleKind,
) -> ExportMetadata {
    ExportMetadata {
        description: description.to_string(),
        date,
        folder: folder.to_string(),
        region: region.to_string(),
        region_bounds,
        crs: grid.crs.clone(),
        scale,
        geotransform: grid.geotransform,
        width: grid.width,
        height: grid.height,
        valid_pixels,
        resample,
        conversion_tool: env!("CARGO_PKG_NAME").to_string(),
        conversion_version: env!("CARGO_PKG_VERSION").to_string(),
        conversion_timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Write `<output stem>.json` next to the raster
pub fn create_metadata_sidecar(
    output_path: &Path,
    meta: &ExportMetadata,
) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
    let sidecar_path = output_path.with_extension("json");
    let json_string = serde_json::to_string_pretty(meta)?;
    std::fs::write(&sidecar_path, json_string)?;
    info!("Created metadata sidecar: {:?}", sidecar_path);
    Ok(sidecar_path)
}
