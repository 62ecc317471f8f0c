use std::cell::RefCell;

use chrono::NaiveDate;
use ndarray::{Array2, array};

use sifdown::types::{BAND_NIR, BAND_RED, BAND_SIF, BAND_SIF_RE};
use sifdown::{
    DownscaleConfig, Error, ExportSink, ExportTask, Gazetteer, Grid, Image, ImageCollection,
    ImageSource, JobHandle, Region, SifSource, downscale_to_image, run_downscaling,
};

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, m, day).unwrap()
}

fn modis_grid() -> Grid {
    Grid::new("EPSG:4326", [0.0, 0.5, 0.0, 2.0, 0.0, -0.5], 4, 4)
}

fn sif_grid() -> Grid {
    Grid::new("EPSG:4326", [0.0, 1.0, 0.0, 2.0, 0.0, -1.0], 2, 2)
}

fn reflectance(date: NaiveDate, red: Array2<f64>, nir: Array2<f64>) -> Image {
    Image::new(format!("MCD43A4_{}", date), Some(date), modis_grid())
        .with_band(BAND_RED, red)
        .unwrap()
        .with_band(BAND_NIR, nir)
        .unwrap()
}

/// In-memory MODIS archive
struct Archive(Vec<Image>);

impl Archive {
    fn august() -> Self {
        let flat = |v: f64| Array2::from_elem((4, 4), v);
        // varies by column so it would skew the ratio if it leaked into the window
        let ramp = Array2::from_shape_fn((4, 4), |(_, c)| 2000.0 + 1000.0 * c as f64);
        Archive(vec![
            reflectance(d(7, 24), flat(1000.0), flat(3000.0)),
            reflectance(d(8, 1), flat(1000.0), flat(5000.0)),
            reflectance(d(8, 9), flat(1000.0), ramp),
        ])
    }
}

impl ImageSource for Archive {
    fn query(&self, start: NaiveDate, end: NaiveDate) -> sifdown::Result<ImageCollection> {
        let images = self
            .0
            .iter()
            .filter(|img| img.date.is_some_and(|dt| dt >= start && dt < end))
            .cloned()
            .collect();
        Ok(ImageCollection::from_images(images))
    }
}

struct Sif;

impl SifSource for Sif {
    fn sif_image(&self, date: NaiveDate) -> sifdown::Result<Image> {
        if date != d(8, 1) {
            return Err(Error::MissingAsset {
                path: format!("TROPOMISIF16d4_{}.tif", date),
            });
        }
        Image::new("TROPOMISIF16d4_2018-08-01", Some(date), sif_grid())
            .with_band(BAND_SIF, array![[1.2, 2.4], [3.6, 4.8]])
    }
}

struct States(Vec<Region>);

impl Gazetteer for States {
    fn lookup(&self, name: &str) -> sifdown::Result<Region> {
        self.0
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| Error::RegionNotFound {
                name: name.to_string(),
            })
    }
}

fn states() -> States {
    let ring = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]
        .iter()
        .map(|p| p.to_vec())
        .collect();
    let ct = geojson::Geometry::new(geojson::Value::Polygon(vec![ring]));
    States(vec![Region::new("Connecticut", Some(ct))])
}

#[derive(Default)]
struct RecordingSink {
    tasks: RefCell<Vec<ExportTask>>,
}

impl ExportSink for RecordingSink {
    fn submit(&self, task: ExportTask) -> sifdown::Result<JobHandle> {
        task.output_grid()?;
        let handle = JobHandle {
            id: self.tasks.borrow().len() as u64 + 1,
            description: task.description.clone(),
            destination: format!("{}/{}.tif", task.folder, task.description).into(),
        };
        self.tasks.borrow_mut().push(task);
        Ok(handle)
    }
}

#[test]
fn downscaled_sif_follows_bilinear_sif_over_constant_nirv() {
    let config = DownscaleConfig::default();
    let sink = RecordingSink::default();
    let report = run_downscaling(&config, &[d(8, 1)], &Archive::august(), &states(), &Sif, &sink)
        .unwrap();
    assert_eq!((report.queued, report.skipped, report.failed), (1, 0, 0));

    let tasks = sink.tasks.borrow();
    let task = &tasks[0];
    assert_eq!(task.description, "SIF_500m_2018-08-01");
    assert_eq!(task.folder, "SIF_500");
    assert_eq!(task.image.grid, modis_grid());

    // the 08-09 image sits on the exclusive window end, so the NIRv mean is
    // flat and cancels out of SIF_RE
    let out = task.image.band(BAND_SIF_RE).unwrap();
    assert!((out[[0, 0]] - 0.0012).abs() < 1e-12);
    assert!((out[[1, 1]] - 0.0021).abs() < 1e-12);
    assert!((out[[3, 3]] - 0.0048).abs() < 1e-12);
}

#[test]
fn dates_without_sif_fail_alone() {
    let config = DownscaleConfig::default();
    let sink = RecordingSink::default();
    let report =
        run_downscaling(&config, &[], &Archive::august(), &states(), &Sif, &sink).unwrap();
    assert_eq!(report.queued, 1);
    assert_eq!(report.failed, config.dates.len() - 1);
    assert!(report.failures.iter().all(|(date, _)| *date != d(8, 1)));
}

#[test]
fn unknown_region_stops_the_run() {
    let config = DownscaleConfig {
        region_name: "Atlantis".to_string(),
        ..DownscaleConfig::default()
    };
    let err = run_downscaling(
        &config,
        &[],
        &Archive::august(),
        &states(),
        &Sif,
        &RecordingSink::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::RegionNotFound { name } if name == "Atlantis"));
}

#[test]
fn in_memory_matches_export_payload() {
    let config = DownscaleConfig::default();
    let image = downscale_to_image(&config, d(8, 1), &Archive::august(), &Sif).unwrap();
    assert_eq!(image.valid_count(BAND_SIF_RE).unwrap(), 16);
    assert!((image.band(BAND_SIF_RE).unwrap()[[1, 1]] - 0.0021).abs() < 1e-12);
}
