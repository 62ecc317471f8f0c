use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::core::processing::resample::Resampler;
use crate::core::raster::{Grid, Image, ImageCollection};
use crate::error::{Error, Result};
use crate::types::{BAND_NIRV, ResampleKind};

/// Window means for one target date
#[derive(Debug, Clone)]
pub struct Composite {
    /// Mean NIRv on the collection's native grid
    pub native_mean: Image,
    /// Mean of the members after each was reprojected to the SIF grid
    pub reprojected_mean: Image,
    /// Number of images in the window
    pub members: usize,
}

/// Compositing window `[date - days, date + days)`
pub fn window(date: NaiveDate, days: u64) -> Result<(NaiveDate, NaiveDate)> {
    let span = Days::new(days);
    let start = date
        .checked_sub_days(span)
        .ok_or_else(|| Error::Processing(format!("window start out of range for {}", date)))?;
    let end = date
        .checked_add_days(span)
        .ok_or_else(|| Error::Processing(format!("window end out of range for {}", date)))?;
    Ok((start, end))
}

/// Filter `index` to the window around `date` and average NIRv twice: once on
/// the native grid, once after reprojecting every member to `target`.
/// Members are reprojected before the reduction, never the mean itself.
pub fn composite(
    index: &ImageCollection,
    date: NaiveDate,
    window_days: u64,
    target: &Grid,
    resampler: &dyn Resampler,
) -> Result<Composite> {
    let (start, end) = window(date, window_days)?;
    let in_window = index.filter_date(start, end);
    if in_window.is_empty() {
        return Err(Error::EmptyWindow { date, start, end });
    }
    debug!(
        "Window [{}, {}) holds {} images",
        start,
        end,
        in_window.len()
    );

    let nirv_only = in_window.map(|img| img.select(&[BAND_NIRV]))?;
    let native_mean = nirv_only.mean(BAND_NIRV)?;

    let reprojected =
        nirv_only.map(|img| resampler.reproject(img, target, ResampleKind::Bilinear))?;
    let reprojected_mean = reprojected.mean(BAND_NIRV)?;

    Ok(Composite {
        native_mean,
        reprojected_mean,
        members: in_window.len(),
    })
}
