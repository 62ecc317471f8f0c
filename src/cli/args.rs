use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sifdown",
    version,
    about = "Downscale TROPOMI SIF to the MODIS 500 m grid with a NIRv ratio"
)]
pub struct CliArgs {
    /// Directory of MCD43A4 GeoTIFFs (one per date, date in the file name)
    #[arg(long)]
    pub modis_dir: Option<PathBuf>,

    /// Directory of SIF assets named <prefix><YYYY-MM-DD>.tif
    #[arg(long)]
    pub sif_dir: Option<PathBuf>,

    /// GeoJSON FeatureCollection used as the region gazetteer
    #[arg(long)]
    pub regions: Option<PathBuf>,

    /// Export root; files land under <output-dir>/<folder>/
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON run configuration (defaults to the August 2018 Connecticut batch)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run only these dates (repeatable); dates missing from the config are skipped
    #[arg(long = "date", value_name = "YYYY-MM-DD")]
    pub dates: Vec<NaiveDate>,

    /// Override the configured region name
    #[arg(long)]
    pub region: Option<String>,

    /// Validate and log exports without writing files
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
