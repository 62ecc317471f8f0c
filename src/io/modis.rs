use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::params::DownscaleConfig;
use crate::core::processing::ops::mask_values;
use crate::core::raster::{Image, ImageCollection};
use crate::error::{Error, Result};
use crate::io::gdal::GdalRasterReader;
use crate::types::{BAND_NIR, BAND_RED};

/// Image-collection query capability
pub trait ImageSource {
    /// Images acquired in `[start, end)`, ordered by date
    fn query(&self, start: NaiveDate, end: NaiveDate) -> Result<ImageCollection>;
}

/// Directory of MCD43A4 GeoTIFFs, one file per acquisition date. The date is
/// taken from the file stem, either `YYYY-MM-DD` or the MODIS `AYYYYDDD` form.
#[derive(Debug, Clone)]
pub struct ModisArchive {
    pub dir: PathBuf,
    pub red_band: usize,
    pub nir_band: usize,
    pub fill_values: Vec<f64>,
}

impl ModisArchive {
    pub fn new<P: AsRef<Path>>(dir: P, red_band: usize, nir_band: usize) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            red_band,
            nir_band,
            fill_values: Vec::new(),
        }
    }

    pub fn from_config<P: AsRef<Path>>(dir: P, config: &DownscaleConfig) -> Self {
        let mut archive = Self::new(dir, config.red_band, config.nir_band);
        if let Some(fill) = config.reflectance_fill {
            archive.fill_values.push(fill);
        }
        archive
    }

    /// All dated rasters in the archive, sorted by date
    pub fn scan(&self) -> Result<Vec<(NaiveDate, PathBuf)>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_tiff = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
                .unwrap_or(false);
            if !path.is_file() || !is_tiff {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            match parse_acquisition_date(stem) {
                Some(date) => found.push((date, path)),
                None => warn!("Skipping raster without an acquisition date: {:?}", path),
            }
        }
        found.sort();
        Ok(found)
    }

    fn load(&self, date: NaiveDate, path: &Path) -> Result<Image> {
        let reader = GdalRasterReader::open(path)?;
        let red_index = reader
            .band_index_by_description(BAND_RED)
            .unwrap_or(self.red_band);
        let nir_index = reader
            .band_index_by_description(BAND_NIR)
            .unwrap_or(self.nir_band);
        let mut red = reader.read_band(red_index)?;
        let mut nir = reader.read_band(nir_index)?;
        mask_values(&mut red, &self.fill_values);
        mask_values(&mut nir, &self.fill_values);
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| date.to_string());
        debug!("Loaded {} ({}x{})", id, reader.metadata.size_x, reader.metadata.size_y);
        Image::new(id, Some(date), reader.grid())
            .with_band(BAND_RED, red)?
            .with_band(BAND_NIR, nir)
    }
}

impl ImageSource for ModisArchive {
    fn query(&self, start: NaiveDate, end: NaiveDate) -> Result<ImageCollection> {
        let mut images = Vec::new();
        for (date, path) in self.scan()? {
            if date >= start && date < end {
                images.push(self.load(date, &path)?);
            }
        }
        if images.is_empty() {
            return Err(Error::Processing(format!(
                "No MODIS rasters in {:?} for [{}, {})",
                self.dir, start, end
            )));
        }
        info!(
            "Loaded {} MODIS rasters for [{}, {}) from {:?}",
            images.len(),
            start,
            end,
            self.dir
        );
        Ok(ImageCollection::from_images(images))
    }
}

/// Acquisition date embedded in a file stem
pub fn parse_acquisition_date(stem: &str) -> Option<NaiveDate> {
    for i in 0..stem.len() {
        if let Some(candidate) = stem.get(i..i + 10) {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, "%Y-%m-%d") {
                return Some(date);
            }
        }
    }

    // MODIS granule naming: ".A2018213."
    let bytes = stem.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'A' || i + 8 > bytes.len() {
            continue;
        }
        let digits = &bytes[i + 1..i + 8];
        let bounded = bytes.get(i + 8).map_or(true, |c| !c.is_ascii_digit());
        if digits.iter().all(u8::is_ascii_digit) && bounded {
            let year: i32 = stem[i + 1..i + 5].parse().ok()?;
            let doy: u32 = stem[i + 5..i + 8].parse().ok()?;
            if let Some(date) = NaiveDate::from_yo_opt(year, doy) {
                return Some(date);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_and_modis_dates() {
        assert_eq!(
            parse_acquisition_date("MCD43A4_2018-07-24"),
            NaiveDate::from_ymd_opt(2018, 7, 24)
        );
        assert_eq!(
            parse_acquisition_date("MCD43A4.A2018213.h12v04.006"),
            NaiveDate::from_ymd_opt(2018, 8, 1)
        );
        assert_eq!(parse_acquisition_date("readme"), None);
    }

    #[test]
    fn scan_ignores_undated_and_non_tiff_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("MCD43A4_2018-08-05.tif"), b"").unwrap();
        fs::write(dir.path().join("MCD43A4_2018-08-01.tif"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("mosaic.tif"), b"").unwrap();
        let archive = ModisArchive::new(dir.path(), 1, 2);
        let dates: Vec<_> = archive.scan().unwrap().into_iter().map(|(d, _)| d).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2018, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2018, 8, 5).unwrap(),
            ]
        );
    }
}
