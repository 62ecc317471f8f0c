//! In-memory raster model: `Grid` (CRS + affine geotransform + size), `Image`
//! (named `f64` bands on one grid, `NaN` as no-data) and `ImageCollection`
//! (images ordered by acquisition date).
use chrono::NaiveDate;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Georeferenced pixel grid. `geotransform` follows the GDAL convention
/// `[origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height]`, pixel-is-area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub crs: String,
    pub geotransform: [f64; 6],
    pub width: usize,
    pub height: usize,
}

impl Grid {
    pub fn new(crs: impl Into<String>, geotransform: [f64; 6], width: usize, height: usize) -> Self {
        Self {
            crs: crs.into(),
            geotransform,
            width,
            height,
        }
    }

    /// Array shape `(rows, cols)` of bands living on this grid
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Map coordinates of the centre of pixel (col, row)
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let gt = &self.geotransform;
        let px = col as f64 + 0.5;
        let py = row as f64 + 0.5;
        (
            gt[0] + px * gt[1] + py * gt[2],
            gt[3] + px * gt[4] + py * gt[5],
        )
    }

    /// Inverse of the geotransform: map coordinates to fractional pixel space
    pub fn inverse_geotransform(&self) -> Result<[f64; 6]> {
        let gt = &self.geotransform;
        let det = gt[1] * gt[5] - gt[2] * gt[4];
        if det.abs() < f64::EPSILON {
            return Err(Error::Processing(format!(
                "Non-invertible geotransform: {:?}",
                gt
            )));
        }
        let inv_det = 1.0 / det;
        let a = gt[5] * inv_det;
        let b = -gt[2] * inv_det;
        let d = -gt[4] * inv_det;
        let e = gt[1] * inv_det;
        Ok([
            -gt[0] * a - gt[3] * b,
            a,
            b,
            -gt[0] * d - gt[3] * e,
            d,
            e,
        ])
    }

    pub fn same_crs(&self, other: &Grid) -> bool {
        self.crs.trim().eq_ignore_ascii_case(other.crs.trim())
    }
}

/// A named band of `f64` samples
#[derive(Debug, Clone)]
pub struct Band {
    pub name: String,
    pub data: Array2<f64>,
}

/// Multi-band raster tied to an acquisition date and a grid. Every
/// transformation returns a new `Image`.
#[derive(Debug, Clone)]
pub struct Image {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub grid: Grid,
    bands: Vec<Band>,
}

impl Image {
    pub fn new(id: impl Into<String>, date: Option<NaiveDate>, grid: Grid) -> Self {
        Self {
            id: id.into(),
            date,
            grid,
            bands: Vec::new(),
        }
    }

    /// Return a copy of this image with one more band
    pub fn with_band(mut self, name: impl Into<String>, data: Array2<f64>) -> Result<Self> {
        let name = name.into();
        if self.has_band(&name) {
            return Err(Error::DuplicateBand {
                band: name,
                image: self.id.clone(),
            });
        }
        if data.dim() != self.grid.shape() {
            return Err(Error::DimensionMismatch {
                expected: self.grid.shape(),
                found: data.dim(),
            });
        }
        self.bands.push(Band { name, data });
        Ok(self)
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|b| b.name == name)
    }

    pub fn band(&self, name: &str) -> Result<&Array2<f64>> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.data)
            .ok_or_else(|| Error::MissingBand {
                band: name.to_string(),
                image: self.id.clone(),
            })
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    /// New image holding only the named bands, in the requested order
    pub fn select(&self, names: &[&str]) -> Result<Image> {
        let mut out = Image::new(self.id.clone(), self.date, self.grid.clone());
        for name in names {
            out = out.with_band(*name, self.band(name)?.clone())?;
        }
        Ok(out)
    }

    pub fn rename(mut self, from: &str, to: &str) -> Result<Image> {
        if from != to && self.has_band(to) {
            return Err(Error::DuplicateBand {
                band: to.to_string(),
                image: self.id.clone(),
            });
        }
        let band = self
            .bands
            .iter_mut()
            .find(|b| b.name == from)
            .ok_or_else(|| Error::MissingBand {
                band: from.to_string(),
                image: self.id.clone(),
            })?;
        band.name = to.to_string();
        Ok(self)
    }

    /// Count of defined (non-NaN) samples in a band
    pub fn valid_count(&self, name: &str) -> Result<usize> {
        Ok(self.band(name)?.iter().filter(|v| !v.is_nan()).count())
    }
}

/// Images sharing a band schema, ordered by acquisition date
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    images: Vec<Image>,
}

impl ImageCollection {
    pub fn from_images(mut images: Vec<Image>) -> Self {
        images.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn first(&self) -> Option<&Image> {
        self.images.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Image> {
        self.images.iter()
    }

    /// Images acquired in `[start, end)`. Undated images never match.
    pub fn filter_date(&self, start: NaiveDate, end: NaiveDate) -> ImageCollection {
        let images = self
            .images
            .iter()
            .filter(|img| matches!(img.date, Some(d) if d >= start && d < end))
            .cloned()
            .collect();
        ImageCollection { images }
    }

    pub fn map<F>(&self, f: F) -> Result<ImageCollection>
    where
        F: Fn(&Image) -> Result<Image>,
    {
        let images = self.images.iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(ImageCollection::from_images(images))
    }

    /// Per-pixel mean of `band` across the collection, skipping no-data.
    /// Pixels with no defined sample stay `NaN`. All members must share one grid.
    pub fn mean(&self, band: &str) -> Result<Image> {
        let first = self
            .images
            .first()
            .ok_or_else(|| Error::Processing("mean of an empty collection".to_string()))?;
        let grid = first.grid.clone();
        let shape = grid.shape();
        let mut sum = Array2::<f64>::zeros(shape);
        let mut count = Array2::<u32>::zeros(shape);

        for img in &self.images {
            if img.grid != grid {
                return Err(Error::GridMismatch(format!(
                    "{} does not share the grid of {}",
                    img.id, first.id
                )));
            }
            Zip::from(&mut sum)
                .and(&mut count)
                .and(img.band(band)?)
                .for_each(|s, c, &v| {
                    if !v.is_nan() {
                        *s += v;
                        *c += 1;
                    }
                });
        }

        let mut mean = Array2::<f64>::from_elem(shape, f64::NAN);
        Zip::from(&mut mean)
            .and(&sum)
            .and(&count)
            .par_for_each(|m, &s, &c| {
                if c > 0 {
                    *m = s / c as f64;
                }
            });

        Image::new(format!("mean({})", band), None, grid).with_band(band, mean)
    }
}

impl<'a> IntoIterator for &'a ImageCollection {
    type Item = &'a Image;
    type IntoIter = std::slice::Iter<'a, Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid() -> Grid {
        Grid::new("EPSG:4326", [10.0, 0.5, 0.0, 20.0, 0.0, -0.5], 2, 2)
    }

    fn dated(id: &str, day: u32, values: Array2<f64>) -> Image {
        Image::new(id, NaiveDate::from_ymd_opt(2018, 8, day), grid())
            .with_band("NIRv", values)
            .unwrap()
    }

    #[test]
    fn pixel_center_and_inverse_agree() {
        let g = grid();
        let (x, y) = g.pixel_center(1, 0);
        assert_eq!((x, y), (10.75, 19.75));
        let inv = g.inverse_geotransform().unwrap();
        let px = inv[0] + inv[1] * x + inv[2] * y;
        let py = inv[3] + inv[4] * x + inv[5] * y;
        assert!((px - 1.5).abs() < 1e-12);
        assert!((py - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_duplicate_and_misshapen_bands() {
        let img = Image::new("a", None, grid())
            .with_band("NIRv", Array2::zeros((2, 2)))
            .unwrap();
        assert!(matches!(
            img.clone().with_band("NIRv", Array2::zeros((2, 2))),
            Err(Error::DuplicateBand { .. })
        ));
        assert!(matches!(
            img.with_band("Ratio", Array2::zeros((3, 2))),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn filter_date_is_start_inclusive_end_exclusive() {
        let c = ImageCollection::from_images(vec![
            dated("c", 9, Array2::zeros((2, 2))),
            dated("a", 1, Array2::zeros((2, 2))),
            dated("b", 5, Array2::zeros((2, 2))),
        ]);
        assert_eq!(c.first().unwrap().id, "a");
        let start = NaiveDate::from_ymd_opt(2018, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2018, 8, 9).unwrap();
        let ids: Vec<_> = c.filter_date(start, end).iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn mean_skips_no_data() {
        let c = ImageCollection::from_images(vec![
            dated("a", 1, array![[1.0, f64::NAN], [3.0, f64::NAN]]),
            dated("b", 2, array![[3.0, 4.0], [f64::NAN, f64::NAN]]),
        ]);
        let m = c.mean("NIRv").unwrap();
        let b = m.band("NIRv").unwrap();
        assert_eq!(b[[0, 0]], 2.0);
        assert_eq!(b[[0, 1]], 4.0);
        assert_eq!(b[[1, 0]], 3.0);
        assert!(b[[1, 1]].is_nan());
    }

    #[test]
    fn mean_requires_common_grid() {
        let other = Image::new("z", NaiveDate::from_ymd_opt(2018, 8, 3), Grid::new(
            "EPSG:4326",
            [0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
            2,
            2,
        ))
        .with_band("NIRv", Array2::zeros((2, 2)))
        .unwrap();
        let c = ImageCollection::from_images(vec![dated("a", 1, Array2::zeros((2, 2))), other]);
        assert!(matches!(c.mean("NIRv"), Err(Error::GridMismatch(_))));
    }

    #[test]
    fn degenerate_inputs_are_processing_errors() {
        let empty = ImageCollection::from_images(Vec::new());
        assert!(matches!(empty.mean("NIRv"), Err(Error::Processing(_))));
        let flat = Grid::new("EPSG:4326", [0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 2, 2);
        assert!(matches!(flat.inverse_geotransform(), Err(Error::Processing(_))));
    }
}
