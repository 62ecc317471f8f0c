use crate::core::processing::ops::{product_arrays, ratio_arrays};
use crate::core::processing::resample::Resampler;
use crate::core::raster::{Grid, Image};
use crate::error::{Error, Result};
use crate::types::{BAND_NIRV, BAND_RATIO, BAND_SIF, BAND_SIF_RE, ResampleKind, SIF_UNIT_DIVISOR};

/// `Ratio = SIF / NIRv_mean` on the SIF grid, resampled bilinearly onto `native`.
/// `reprojected_mean` must already live on the SIF grid.
pub fn ratio(
    sif: &Image,
    reprojected_mean: &Image,
    native: &Grid,
    resampler: &dyn Resampler,
) -> Result<Image> {
    if sif.grid != reprojected_mean.grid {
        return Err(Error::GridMismatch(format!(
            "{} and {} must share the SIF grid",
            sif.id, reprojected_mean.id
        )));
    }
    let values = ratio_arrays(sif.band(BAND_SIF)?, reprojected_mean.band(BAND_NIRV)?)?;
    let on_sif_grid = Image::new(format!("ratio({})", sif.id), sif.date, sif.grid.clone())
        .with_band(BAND_RATIO, values)?;
    resampler.reproject(&on_sif_grid, native, ResampleKind::Bilinear)
}

/// `SIF_RE = native_mean * Ratio / 1000`, resampled bilinearly onto `native`
pub fn reconstruct(
    native_mean: &Image,
    ratio: &Image,
    native: &Grid,
    resampler: &dyn Resampler,
) -> Result<Image> {
    if native_mean.grid != ratio.grid {
        return Err(Error::GridMismatch(format!(
            "{} and {} must share the native grid",
            native_mean.id, ratio.id
        )));
    }
    let mut values = product_arrays(native_mean.band(BAND_NIRV)?, ratio.band(BAND_RATIO)?)?;
    values.par_mapv_inplace(|v| v / SIF_UNIT_DIVISOR);
    let image = Image::new(
        format!("sif_re({})", ratio.id),
        ratio.date,
        ratio.grid.clone(),
    )
    .with_band(BAND_SIF_RE, values)?;
    resampler.reproject(&image, native, ResampleKind::Bilinear)
}
