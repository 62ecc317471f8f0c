//! Per-date driver: composite, ratio, reconstruction and export submission.
//! One date failing is logged and counted; the remaining dates still run.
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, info_span, warn};

use crate::core::params::DownscaleConfig;
use crate::core::processing::composite::composite;
use crate::core::processing::downscale::{ratio, reconstruct};
use crate::core::processing::resample::Resampler;
use crate::core::raster::{Grid, Image, ImageCollection};
use crate::error::Result;
use crate::io::region::Region;
use crate::io::sif::SifSource;
use crate::io::writers::export::{ExportSink, ExportTask, JobHandle};

/// Inputs shared by every date of a batch
pub struct DownscaleContext<'a> {
    pub config: &'a DownscaleConfig,
    /// NIRv-annotated MODIS collection
    pub index: &'a ImageCollection,
    /// Grid of the MODIS collection; outputs land here before export
    pub native: Grid,
    pub resampler: &'a dyn Resampler,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchReport {
    pub queued: usize,
    pub skipped: usize,
    pub failed: usize,
    pub jobs: Vec<JobHandle>,
    pub failures: Vec<(NaiveDate, String)>,
}

/// Downscaled `SIF_RE` for one date on the native grid
pub fn downscale_date(ctx: &DownscaleContext<'_>, date: NaiveDate, sif: &Image) -> Result<Image> {
    let c = composite(
        ctx.index,
        date,
        ctx.config.window_days,
        &sif.grid,
        ctx.resampler,
    )?;
    info!("Composited {} NIRv images", c.members);
    let r = ratio(sif, &c.reprojected_mean, &ctx.native, ctx.resampler)?;
    let mut sif_re = reconstruct(&c.native_mean, &r, &ctx.native, ctx.resampler)?;
    sif_re.id = ctx.config.export_description(date);
    sif_re.date = Some(date);
    Ok(sif_re)
}

/// Split `requested` into configured dates (in request order) and the rest.
/// An empty request selects every configured date.
pub fn select_dates(
    config: &DownscaleConfig,
    requested: &[NaiveDate],
) -> (Vec<NaiveDate>, Vec<NaiveDate>) {
    let candidates = if requested.is_empty() {
        &config.dates[..]
    } else {
        requested
    };
    let mut selected = Vec::new();
    let mut skipped = Vec::new();
    for &date in candidates {
        if selected.contains(&date) || skipped.contains(&date) {
            warn!("Ignoring repeated date {}", date);
        } else if config.dates.contains(&date) {
            selected.push(date);
        } else {
            warn!("Skipping {}: not a configured date", date);
            skipped.push(date);
        }
    }
    (selected, skipped)
}

/// Run every requested date and submit its export. Only configured dates
/// reach the pipeline.
pub fn run_dates(
    ctx: &DownscaleContext<'_>,
    requested: &[NaiveDate],
    region: &Region,
    sif_source: &dyn SifSource,
    sink: &dyn ExportSink,
) -> BatchReport {
    let (dates, skipped) = select_dates(ctx.config, requested);
    let mut report = BatchReport {
        skipped: skipped.len(),
        ..BatchReport::default()
    };

    for date in dates {
        let span = info_span!("date", %date);
        let _guard = span.enter();
        let outcome = sif_source
            .sif_image(date)
            .and_then(|sif| downscale_date(ctx, date, &sif))
            .and_then(|image| sink.submit(ExportTask::from_config(ctx.config, date, image, region)));
        match outcome {
            Ok(handle) => {
                report.queued += 1;
                report.jobs.push(handle);
            }
            Err(e) => {
                error!("Date {} failed: {}", date, e);
                report.failed += 1;
                report.failures.push((date, e.to_string()));
            }
        }
    }

    info!(
        "Batch done: queued={} skipped={} failed={}",
        report.queued, report.skipped, report.failed
    );
    report
}
