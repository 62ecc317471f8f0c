//! High-level library API: run a downscaling batch from directories on disk or
//! from caller-supplied sources, or downscale a single date in memory. Prefer
//! these entrypoints over the low-level processing modules when integrating.
use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::core::params::DownscaleConfig;
use crate::core::processing::index::index_collection;
use crate::core::processing::pipeline::{DownscaleContext, downscale_date, run_dates};
use crate::core::processing::resample::GridResampler;
use crate::core::raster::{Image, ImageCollection};
use crate::error::{Error, Result};
use crate::io::modis::{ImageSource, ModisArchive};
use crate::io::region::{Gazetteer, GeoJsonGazetteer};
use crate::io::sif::{SifAssetStore, SifSource};
use crate::io::writers::export::ExportSink;

pub use crate::core::processing::pipeline::BatchReport;

/// Query MODIS over every configured window and attach NIRv
pub fn load_index(config: &DownscaleConfig, source: &dyn ImageSource) -> Result<ImageCollection> {
    let (start, end) = config.query_range().ok_or_else(|| Error::InvalidArgument {
        arg: "dates",
        value: format!("{:?}", config.dates),
    })?;
    let collection = source.query(start, end)?;
    index_collection(&collection, config.reflectance_scale)
}

/// Run the batch against caller-supplied sources and sink. Setup (config,
/// region lookup, MODIS query) fails the whole run; per-date failures are
/// counted in the report. An empty `requested` runs every configured date.
pub fn run_downscaling(
    config: &DownscaleConfig,
    requested: &[NaiveDate],
    source: &dyn ImageSource,
    gazetteer: &dyn Gazetteer,
    sif: &dyn SifSource,
    sink: &dyn ExportSink,
) -> Result<BatchReport> {
    config.validate()?;
    let region = gazetteer.lookup(&config.region_name)?;
    if region.is_empty() {
        warn!(
            "Region {} has no area; every export will be rejected",
            region.name
        );
    }

    let index = load_index(config, source)?;
    let native = index
        .first()
        .map(|img| img.grid.clone())
        .ok_or_else(|| Error::Processing("MODIS collection is empty".to_string()))?;
    info!(
        "Native grid {}x{} on {}",
        native.width, native.height, native.crs
    );

    let ctx = DownscaleContext {
        config,
        index: &index,
        native,
        resampler: &GridResampler,
    };
    Ok(run_dates(&ctx, requested, &region, sif, sink))
}

/// Run the batch from a MODIS directory, a SIF asset directory and a GeoJSON
/// gazetteer
pub fn run_directories(
    config: &DownscaleConfig,
    requested: &[NaiveDate],
    modis_dir: &Path,
    sif_dir: &Path,
    regions: &Path,
    sink: &dyn ExportSink,
) -> Result<BatchReport> {
    let archive = ModisArchive::from_config(modis_dir, config);
    let gazetteer = GeoJsonGazetteer::open(regions, config.region_field.clone())?;
    let store = SifAssetStore::new(sif_dir, config.sif_asset_prefix.clone());
    run_downscaling(config, requested, &archive, &gazetteer, &store, sink)
}

/// Downscale one date without exporting; the result stays on the MODIS grid
pub fn downscale_to_image(
    config: &DownscaleConfig,
    date: NaiveDate,
    source: &dyn ImageSource,
    sif: &dyn SifSource,
) -> Result<Image> {
    let index = load_index(config, source)?;
    let native = index
        .first()
        .map(|img| img.grid.clone())
        .ok_or_else(|| Error::Processing("MODIS collection is empty".to_string()))?;
    let ctx = DownscaleContext {
        config,
        index: &index,
        native,
        resampler: &GridResampler,
    };
    downscale_date(&ctx, date, &sif.sif_image(date)?)
}
