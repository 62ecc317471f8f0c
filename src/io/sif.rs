use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::raster::Image;
use crate::error::{Error, Result};
use crate::io::gdal::GdalRasterReader;
use crate::types::BAND_SIF;

/// Per-date SIF lookup
pub trait SifSource {
    fn sif_image(&self, date: NaiveDate) -> Result<Image>;
}

/// Pre-ingested SIF rasters named `<root>/<prefix><YYYY-MM-DD>.tif`
#[derive(Debug, Clone)]
pub struct SifAssetStore {
    pub root: PathBuf,
    pub prefix: String,
}

impl SifAssetStore {
    pub fn new<P: AsRef<Path>>(root: P, prefix: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            prefix: prefix.into(),
        }
    }

    pub fn asset_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(format!("{}{}.tif", self.prefix, date))
    }
}

impl SifSource for SifAssetStore {
    fn sif_image(&self, date: NaiveDate) -> Result<Image> {
        let path = self.asset_path(date);
        if !path.is_file() {
            return Err(Error::MissingAsset {
                path: path.display().to_string(),
            });
        }
        let reader = GdalRasterReader::open(&path)?;
        let data = reader.read_band(1)?;
        debug!("Loaded SIF asset {:?} on {}", path, reader.metadata.projection);
        Image::new(format!("{}{}", self.prefix, date), Some(date), reader.grid())
            .with_band(BAND_SIF, data)
    }
}
