use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sifdown::api::{BatchReport, run_directories};
use sifdown::core::params::DownscaleConfig;
use sifdown::io::writers::export::{DryRunSink, JobState, JobStatus, LocalGeoTiffSink};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn require_dir(arg: &str, path: Option<PathBuf>) -> Result<PathBuf, AppError> {
    let path = path.ok_or_else(|| AppError::MissingArgument {
        arg: arg.to_string(),
    })?;
    if !path.is_dir() {
        return Err(AppError::NotADirectory {
            arg: arg.to_string(),
            path,
        });
    }
    Ok(path)
}

fn print_summary(report: &BatchReport, statuses: Option<&[JobStatus]>) {
    println!(
        "queued: {}  skipped: {}  failed: {}",
        report.queued, report.skipped, report.failed
    );
    for (date, reason) in &report.failures {
        println!("  {} failed: {}", date, reason);
    }
    if let Some(statuses) = statuses {
        let written = statuses
            .iter()
            .filter(|s| s.state == JobState::Completed)
            .count();
        println!("exports written: {}/{}", written, statuses.len());
        for status in statuses {
            if let JobState::Failed(reason) = &status.state {
                println!("  {} export failed: {}", status.handle.description, reason);
            }
        }
    }
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    let mut config = match &args.config {
        Some(path) => DownscaleConfig::from_file(path).map_err(AppError::from)?,
        None => DownscaleConfig::default(),
    };
    if let Some(region) = args.region {
        config.region_name = region;
    }

    let modis_dir = require_dir("--modis-dir", args.modis_dir)?;
    let sif_dir = require_dir("--sif-dir", args.sif_dir)?;
    let regions = args.regions.ok_or(AppError::MissingArgument {
        arg: "--regions".to_string(),
    })?;

    info!("MODIS archive: {:?}", modis_dir);
    info!("SIF assets: {:?}", sif_dir);
    info!("Region: {} from {:?}", config.region_name, regions);

    if args.dry_run {
        let sink = DryRunSink::default();
        let report = run_directories(&config, &args.dates, &modis_dir, &sif_dir, &regions, &sink)
            .map_err(AppError::from)?;
        print_summary(&report, None);
        return Ok(());
    }

    let output_dir = args.output_dir.ok_or(AppError::MissingArgument {
        arg: "--output-dir".to_string(),
    })?;
    let sink = LocalGeoTiffSink::new(&output_dir).map_err(AppError::from)?;
    info!("Export root: {:?}", sink.root());

    let report = run_directories(&config, &args.dates, &modis_dir, &sif_dir, &regions, &sink)
        .map_err(AppError::from)?;
    if report.queued > 0 {
        info!("Waiting for {} queued exports", report.queued);
    } else {
        warn!("Nothing was queued for export");
    }
    let statuses = sink.wait();
    print_summary(&report, Some(statuses.as_slice()));
    Ok(())
}
