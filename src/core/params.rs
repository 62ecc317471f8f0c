use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};
use crate::types::ResampleKind;

/// Run configuration; every literal of the batch lives here with its default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownscaleConfig {
    /// Target SIF dates, one export each
    pub dates: Vec<NaiveDate>,
    /// Region to clip exports to, matched exactly against `region_field`
    pub region_name: String,
    pub region_field: String,
    /// Destination folder under the export root
    pub folder: String,
    /// Export name is `<description_prefix><date>`
    pub description_prefix: String,
    /// SIF asset file name is `<sif_asset_prefix><date>.tif`
    pub sif_asset_prefix: String,
    /// Output pixel size in metres
    pub scale: f64,
    pub crs: String,
    pub max_pixels: u64,
    /// Half-width of the compositing window
    pub window_days: u64,
    /// Multiplier turning reflectance digital numbers into reflectance
    pub reflectance_scale: f64,
    /// Raw reflectance value treated as no-data
    pub reflectance_fill: Option<f64>,
    /// 1-based band indices of red and NIR reflectance in the MODIS rasters
    pub red_band: usize,
    pub nir_band: usize,
    /// Interpolation used when the result is regridded for export
    pub export_resample: ResampleKind,
}

fn default_dates() -> Vec<NaiveDate> {
    [1, 5, 9, 13, 17, 21, 25, 29]
        .into_iter()
        .filter_map(|day| NaiveDate::from_ymd_opt(2018, 8, day))
        .collect()
}

impl Default for DownscaleConfig {
    fn default() -> Self {
        Self {
            dates: default_dates(),
            region_name: "Connecticut".to_string(),
            region_field: "NAME".to_string(),
            folder: "SIF_500".to_string(),
            description_prefix: "SIF_500m_".to_string(),
            sif_asset_prefix: "TROPOMISIF16d4_".to_string(),
            scale: 500.0,
            crs: "EPSG:4326".to_string(),
            max_pixels: 10_000_000_000_000,
            window_days: 8,
            reflectance_scale: 0.0001,
            reflectance_fill: Some(32767.0),
            red_band: 1,
            nir_band: 2,
            export_resample: ResampleKind::Bilinear,
        }
    }
}

impl DownscaleConfig {
    /// Load a JSON config. Leading `//` header lines are tolerated so preset
    /// files can carry a comment banner.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let json_start = content.find('{').ok_or_else(|| Error::InvalidArgument {
            arg: "config",
            value: format!("{}: no JSON content found", path.as_ref().display()),
        })?;
        let config: DownscaleConfig = serde_json::from_str(&content[json_start..])?;
        config.validate()?;
        info!("Config loaded from: {:?}", path.as_ref());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dates.is_empty() {
            return Err(Error::InvalidArgument {
                arg: "dates",
                value: "[]".to_string(),
            });
        }
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(Error::InvalidArgument {
                arg: "scale",
                value: self.scale.to_string(),
            });
        }
        if self.max_pixels == 0 {
            return Err(Error::InvalidArgument {
                arg: "max_pixels",
                value: "0".to_string(),
            });
        }
        if self.red_band == 0 || self.nir_band == 0 || self.red_band == self.nir_band {
            return Err(Error::InvalidArgument {
                arg: "red_band/nir_band",
                value: format!("{}/{}", self.red_band, self.nir_band),
            });
        }
        if self.region_name.trim().is_empty() {
            return Err(Error::InvalidArgument {
                arg: "region_name",
                value: self.region_name.clone(),
            });
        }
        Ok(())
    }

    pub fn export_description(&self, date: NaiveDate) -> String {
        format!("{}{}", self.description_prefix, date)
    }

    /// Date range covering every configured window, `[first - w, last + w)`
    pub fn query_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let days = chrono::Days::new(self.window_days);
        let first = self.dates.iter().min()?.checked_sub_days(days)?;
        let last = self.dates.iter().max()?.checked_add_days(days)?;
        Some((first, last))
    }
}
