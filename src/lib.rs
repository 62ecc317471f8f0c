#![doc = r#"
sifdown — downscale TROPOMI solar-induced fluorescence (SIF) to the MODIS 500 m grid.

For each target date the crate composites MODIS MCD43A4 NIRv over a ±8 day window,
divides coarse SIF by the window's NIRv mean on the SIF grid, carries that ratio back
to the MODIS grid bilinearly and multiplies it by the native-resolution NIRv mean.
The result (`SIF_RE`) is clipped to a named region and exported as a Float32 GeoTIFF.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Quick start: run a batch from directories
-----------------------------------------
```rust,no_run
use std::path::Path;
use sifdown::{DownscaleConfig, LocalGeoTiffSink, run_directories};

fn main() -> sifdown::Result<()> {
    let config = DownscaleConfig::default();
    let sink = LocalGeoTiffSink::new("/out")?;
    let report = run_directories(
        &config,
        &[], // every configured date
        Path::new("/data/mcd43a4"),
        Path::new("/data/sif"),
        Path::new("/data/tl_2018_us_state.geojson"),
        &sink,
    )?;
    println!("queued={} skipped={} failed={}", report.queued, report.skipped, report.failed);

    // exports run on a background worker; block until they are written
    for status in sink.wait() {
        println!("{} -> {:?}", status.handle.description, status.state);
    }
    Ok(())
}
```

In-memory: one date, no export
------------------------------
```rust,no_run
use chrono::NaiveDate;
use sifdown::{DownscaleConfig, ModisArchive, SifAssetStore, downscale_to_image};

fn main() -> sifdown::Result<()> {
    let config = DownscaleConfig::default();
    let archive = ModisArchive::from_config("/data/mcd43a4", &config);
    let store = SifAssetStore::new("/data/sif", config.sif_asset_prefix.clone());
    let date = NaiveDate::from_ymd_opt(2018, 8, 1).expect("valid date");
    let image = downscale_to_image(&config, date, &archive, &store)?;
    println!("{} valid pixels", image.valid_count("SIF_RE")?);
    Ok(())
}
```

Error handling
--------------
All public functions return `sifdown::Result<T>`. Batch runs contain per-date failures
in the returned `BatchReport`; setup failures (config, region lookup, MODIS query) are
returned as `sifdown::Error`.

```rust,no_run
use std::path::Path;
use sifdown::{DownscaleConfig, DryRunSink, Error, run_directories};

fn main() {
    let config = DownscaleConfig::default();
    let sink = DryRunSink::default();
    match run_directories(&config, &[], Path::new("/m"), Path::new("/s"), Path::new("/r.geojson"), &sink) {
        Ok(report) => println!("failed dates: {}", report.failed),
        Err(Error::RegionNotFound { name }) => eprintln!("no region called {name}"),
        Err(other) => eprintln!("setup failed: {other}"),
    }
}
```

Useful modules
--------------
- [`api`] — high-level entry points.
- [`core`] — raster model, config and the processing steps.
- [`io`] — GDAL readers, MODIS/SIF sources, gazetteer and export writers.
- [`types`] — band names, constants and `ResampleKind`.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::params::DownscaleConfig;
pub use core::raster::{Grid, Image, ImageCollection};
pub use error::{Error, Result};
pub use types::ResampleKind;

// Sources and sinks
pub use io::gdal::{GdalError, GdalRasterReader};
pub use io::modis::{ImageSource, ModisArchive};
pub use io::region::{Gazetteer, GeoJsonGazetteer, Region};
pub use io::sif::{SifAssetStore, SifSource};
pub use io::writers::export::{
    DryRunSink, ExportSink, ExportTask, JobHandle, JobState, JobStatus, LocalGeoTiffSink,
};

// High-level API re-exports
pub use api::{BatchReport, downscale_to_image, load_index, run_directories, run_downscaling};
