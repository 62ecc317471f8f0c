use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::{Dataset, Metadata, errors::GdalError as GdalCrateError};
use ndarray::Array2;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::core::raster::Grid;

/// Errors encountered when using GDAL readers and transforms
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),
    #[error("Dataset has no usable projection: {0}")]
    MissingProjection(String),
}

/// Metadata extracted from a GDAL-supported raster
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection as `EPSG:XXXX` when an authority code is present, WKT otherwise
    pub projection: String,
    /// Per-band descriptions, empty when unset
    pub descriptions: Vec<String>,
}

// EPSG code of the root node only; units and datums carry their own authorities
fn root_epsg(wkt: &str) -> Option<String> {
    let srs = SpatialRef::from_wkt(wkt).ok()?;
    let name = srs.auth_name().ok()?;
    if !name.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    let code = srs.auth_code().ok()?;
    Some(format!("EPSG:{}", code))
}

/// Normalize a WKT or `EPSG:` definition to its shortest stable form. WKT
/// without a root authority (e.g. MODIS sinusoidal) is kept as is.
pub fn normalize_crs(proj: &str) -> String {
    if proj.starts_with("EPSG:") {
        proj.to_string()
    } else if let Some(code) = root_epsg(proj) {
        code
    } else {
        proj.to_string()
    }
}

/// Reader for single-date rasters (MODIS tiles, SIF assets) via GDAL
pub struct GdalRasterReader {
    pub dataset: Dataset,
    pub metadata: RasterMetadata,
}

impl GdalRasterReader {
    /// Open a GDAL-supported raster (e.g., GeoTIFF, NetCDF, HDF4 subdataset)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = dataset.geo_transform()?;
        let proj = dataset.projection();
        if proj.trim().is_empty() {
            return Err(GdalError::MissingProjection(
                path.as_ref().display().to_string(),
            ));
        }
        let mut descriptions = Vec::with_capacity(bands);
        for idx in 1..=bands {
            let band = dataset.rasterband(idx)?;
            descriptions.push(band.description().unwrap_or_default());
        }
        Ok(GdalRasterReader {
            dataset,
            metadata: RasterMetadata {
                size_x: size_x as usize,
                size_y: size_y as usize,
                bands,
                geotransform,
                projection: normalize_crs(&proj),
                descriptions,
            },
        })
    }

    pub fn grid(&self) -> Grid {
        Grid::new(
            self.metadata.projection.clone(),
            self.metadata.geotransform,
            self.metadata.size_x,
            self.metadata.size_y,
        )
    }

    /// 1-based index of the band whose description equals `name`
    pub fn band_index_by_description(&self, name: &str) -> Option<usize> {
        self.metadata
            .descriptions
            .iter()
            .position(|d| d == name)
            .map(|i| i + 1)
    }

    /// Read a single band (1-based index) as an f64 ndarray of shape (height, width).
    /// Samples equal to the band's no-data value become `NaN`.
    pub fn read_band(&self, index: usize) -> Result<Array2<f64>, GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::UnsupportedFormat(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f64>((0, 0), window, window, None)?;
        let no_data = band.no_data_value();
        let mut data_vec = buf.data().to_vec();
        if let Some(nd) = no_data {
            for v in data_vec.iter_mut() {
                if *v == nd || (nd.is_nan() && v.is_nan()) {
                    *v = f64::NAN;
                }
            }
        }
        let len = data_vec.len();
        Array2::from_shape_vec((self.metadata.size_y, self.metadata.size_x), data_vec).map_err(
            |_| {
                GdalError::DimensionMismatch(
                    self.metadata.size_x,
                    self.metadata.size_y,
                    len,
                    1,
                )
            },
        )
    }
}

fn spatial_ref(definition: &str) -> Result<SpatialRef, GdalError> {
    // x = easting/longitude, y = northing/latitude regardless of authority axis order
    gdal::config::set_config_option("OSR_DEFAULT_AXIS_MAPPING_STRATEGY", "TRADITIONAL_GIS_ORDER")?;
    Ok(SpatialRef::from_definition(definition)?)
}

/// Whether a CRS definition describes a geographic (degree-based) system
pub fn is_geographic(definition: &str) -> Result<bool, GdalError> {
    Ok(spatial_ref(definition)?.is_geographic())
}

/// WKT for a CRS definition (`EPSG:XXXX`, PROJ string or WKT)
pub fn crs_to_wkt(definition: &str) -> Result<String, GdalError> {
    Ok(spatial_ref(definition)?.to_wkt()?)
}

/// Batch coordinate transform between two CRS definitions
pub struct GdalCrsTransform {
    inner: CoordTransform,
}

impl GdalCrsTransform {
    pub fn new(src: &str, dst: &str) -> Result<Self, GdalError> {
        let src_srs = spatial_ref(src)?;
        let dst_srs = spatial_ref(dst)?;
        Ok(Self {
            inner: CoordTransform::new(&src_srs, &dst_srs)?,
        })
    }

    /// Transform coordinates in place. Points that cannot be transformed
    /// become `NaN`; the rest are kept.
    pub fn transform(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<(), GdalError> {
        let (src_x, src_y) = (xs.to_vec(), ys.to_vec());
        let mut zs = vec![0.0; xs.len()];
        if self.inner.transform_coords(xs, ys, &mut zs).is_err() {
            // one bad point fails the whole batch; retry point by point
            for i in 0..xs.len() {
                let (mut x, mut y, mut z) = ([src_x[i]], [src_y[i]], [0.0]);
                let ok = self.inner.transform_coords(&mut x, &mut y, &mut z).is_ok();
                xs[i] = if ok { x[0] } else { f64::NAN };
                ys[i] = if ok { y[0] } else { f64::NAN };
            }
        }

        // failed points may also come back as HUGE_VAL
        let mut failed = 0usize;
        for (x, y) in xs.iter_mut().zip(ys.iter_mut()) {
            if !(x.is_finite() && y.is_finite()) {
                *x = f64::NAN;
                *y = f64::NAN;
                failed += 1;
            }
        }
        if failed > 0 {
            debug!("{} of {} points fell outside the target CRS", failed, xs.len());
        }
        Ok(())
    }
}
