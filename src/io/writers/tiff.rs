use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager, Metadata};
use ndarray::Array2;
use std::path::Path;

use crate::core::raster::Grid;
use crate::io::gdal::{GdalError, crs_to_wkt};

/// Write one band as a Float32 GeoTIFF with `NaN` as the no-data value.
/// Returns the open dataset so callers can embed metadata before it closes.
pub fn write_tiff_f32(
    output: &Path,
    grid: &Grid,
    band_name: &str,
    data: &Array2<f64>,
) -> Result<Dataset, GdalError> {
    let (rows, cols) = data.dim();
    if (rows, cols) != grid.shape() {
        return Err(GdalError::DimensionMismatch(grid.width, grid.height, cols, rows));
    }
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type::<f32, _>(output, cols, rows, 1)?;
    ds.set_geo_transform(&grid.geotransform)?;
    ds.set_projection(&crs_to_wkt(&grid.crs)?)?;

    let samples: Vec<f32> = data.iter().map(|&v| v as f32).collect();
    let mut buf = Buffer::new((cols, rows), samples);
    let mut band = ds.rasterband(1)?;
    band.set_no_data_value(Some(f64::NAN))?;
    band.set_description(band_name)?;
    band.write((0, 0), (cols, rows), &mut buf)?;
    drop(band);
    Ok(ds)
}

/// Set `key=value` items in the default metadata domain
pub fn embed_tiff_metadata(ds: &mut Dataset, items: &[(&str, String)]) -> Result<(), GdalError> {
    for (key, value) in items {
        ds.set_metadata_item(key, value, "")?;
    }
    Ok(())
}
