//! Export-to-storage. `ExportSink::submit` validates a task, queues it and
//! returns a `JobHandle` straight away; the job itself runs out of band and
//! reports only through logs (and, for the local sink, `wait`).
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use tracing::{error, info, warn};

use crate::core::params::DownscaleConfig;
use crate::core::processing::resample::{GridResampler, Resampler};
use crate::core::raster::{Grid, Image};
use crate::error::{Error, Result};
use crate::io::gdal::{GdalCrsTransform, is_geographic};
use crate::io::region::{Bounds, Region};
use crate::io::writers::metadata::{create_metadata_sidecar, export_metadata};
use crate::io::writers::tiff::{embed_tiff_metadata, write_tiff_f32};
use crate::types::{METERS_PER_DEGREE, ResampleKind};

/// Everything an export needs, fixed at submission time
#[derive(Debug, Clone)]
pub struct ExportTask {
    pub description: String,
    pub folder: String,
    /// Single-band image to export
    pub image: Image,
    pub region: Region,
    /// Output pixel size in metres
    pub scale: f64,
    pub crs: String,
    pub max_pixels: u64,
    pub resample: ResampleKind,
}

impl ExportTask {
    pub fn from_config(config: &DownscaleConfig, date: NaiveDate, image: Image, region: &Region) -> Self {
        Self {
            description: config.export_description(date),
            folder: config.folder.clone(),
            image,
            region: region.clone(),
            scale: config.scale,
            crs: config.crs.clone(),
            max_pixels: config.max_pixels,
            resample: config.export_resample,
        }
    }

    /// Output grid covering the region bounds at `scale` in `crs`. Rejects
    /// empty regions and grids over the pixel budget.
    pub fn output_grid(&self) -> Result<Grid> {
        let bounds = match self.region.bounds {
            Some(b) if b.has_area() => b,
            _ => {
                return Err(Error::EmptyRegion {
                    name: self.region.name.clone(),
                });
            }
        };

        let wgs84 = self.crs.trim().eq_ignore_ascii_case("EPSG:4326");
        let bounds = if wgs84 {
            bounds
        } else {
            project_bounds(&bounds, &self.crs)?
        };
        let geographic = wgs84 || is_geographic(&self.crs)?;
        let pixel = if geographic {
            self.scale / METERS_PER_DEGREE
        } else {
            self.scale
        };

        let width = ((bounds.width() / pixel).ceil() as usize).max(1);
        let height = ((bounds.height() / pixel).ceil() as usize).max(1);
        let pixels = width as u64 * height as u64;
        if pixels > self.max_pixels {
            return Err(Error::PixelBudgetExceeded {
                pixels,
                max: self.max_pixels,
            });
        }
        Ok(Grid::new(
            self.crs.clone(),
            [bounds.min_x, pixel, 0.0, bounds.max_y, 0.0, -pixel],
            width,
            height,
        ))
    }
}

/// Region bounds (lon/lat) expressed in another CRS via their corners
fn project_bounds(bounds: &Bounds, crs: &str) -> Result<Bounds> {
    let mut xs = [bounds.min_x, bounds.max_x, bounds.max_x, bounds.min_x];
    let mut ys = [bounds.min_y, bounds.min_y, bounds.max_y, bounds.max_y];
    GdalCrsTransform::new("EPSG:4326", crs)?.transform(&mut xs, &mut ys)?;
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(Error::Export(format!("region bounds cannot be expressed in {}", crs)));
    }
    let fold = |v: &[f64], f: fn(f64, f64) -> f64| v.iter().copied().reduce(f).unwrap_or(f64::NAN);
    Ok(Bounds {
        min_x: fold(&xs[..], f64::min),
        min_y: fold(&ys[..], f64::min),
        max_x: fold(&xs[..], f64::max),
        max_y: fold(&ys[..], f64::max),
    })
}

/// Identifier of a queued export; not a completion signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobHandle {
    pub id: u64,
    pub description: String,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JobState {
    Completed,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub handle: JobHandle,
    pub state: JobState,
}

/// Export-to-storage capability
pub trait ExportSink {
    fn submit(&self, task: ExportTask) -> Result<JobHandle>;
}

struct QueuedExport {
    handle: JobHandle,
    grid: Grid,
    task: ExportTask,
}

/// Writes `<root>/<folder>/<description>.tif` plus a JSON sidecar on a
/// background worker thread
pub struct LocalGeoTiffSink {
    root: PathBuf,
    next_id: AtomicU64,
    sender: Option<Sender<QueuedExport>>,
    worker: Option<JoinHandle<Vec<JobStatus>>>,
}

impl LocalGeoTiffSink {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        let (tx, rx) = mpsc::channel::<QueuedExport>();
        let worker = std::thread::spawn(move || {
            let mut statuses = Vec::new();
            for job in rx {
                let state = match run_export(&job) {
                    Ok(()) => {
                        info!(
                            "Export {} finished: {:?}",
                            job.handle.description, job.handle.destination
                        );
                        JobState::Completed
                    }
                    Err(e) => {
                        error!("Export {} failed: {}", job.handle.description, e);
                        JobState::Failed(e.to_string())
                    }
                };
                statuses.push(JobStatus {
                    handle: job.handle,
                    state,
                });
            }
            statuses
        });
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            next_id: AtomicU64::new(1),
            sender: Some(tx),
            worker: Some(worker),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Close the queue and block until every queued job has run
    pub fn wait(mut self) -> Vec<JobStatus> {
        self.finish()
    }

    fn finish(&mut self) -> Vec<JobStatus> {
        drop(self.sender.take());
        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(statuses)) => statuses,
            Some(Err(_)) => {
                error!("Export worker panicked; queued jobs may be incomplete");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

impl Drop for LocalGeoTiffSink {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let statuses = self.finish();
            info!("Export queue drained ({} jobs)", statuses.len());
        }
    }
}

impl ExportSink for LocalGeoTiffSink {
    fn submit(&self, task: ExportTask) -> Result<JobHandle> {
        let grid = task.output_grid()?;
        let handle = JobHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            description: task.description.clone(),
            destination: self
                .root
                .join(&task.folder)
                .join(format!("{}.tif", task.description)),
        };
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| Error::Export("export queue is closed".to_string()))?;
        sender
            .send(QueuedExport {
                handle: handle.clone(),
                grid,
                task,
            })
            .map_err(|_| Error::Export("export worker has stopped".to_string()))?;
        info!(
            "Queued export #{} {} -> {:?}",
            handle.id, handle.description, handle.destination
        );
        Ok(handle)
    }
}

fn run_export(job: &QueuedExport) -> Result<()> {
    let task = &job.task;
    let [band] = task.image.bands() else {
        return Err(Error::Export(format!(
            "{} must be single-band, has {:?}",
            task.image.id,
            task.image.band_names()
        )));
    };
    let regridded = GridResampler.reproject(&task.image, &job.grid, task.resample)?;
    let data = regridded.band(&band.name)?;
    let valid_pixels = regridded.valid_count(&band.name)?;
    if valid_pixels == 0 {
        warn!(
            "Export {} has no valid pixels inside region {}",
            task.description, task.region.name
        );
    }

    let destination = &job.handle.destination;
    let dir = destination
        .parent()
        .ok_or_else(|| Error::Export(format!("no parent directory for {:?}", destination)))?;
    fs::create_dir_all(dir)?;

    let meta = export_metadata(
        &task.description,
        task.image.date.map(|d| d.to_string()),
        &task.folder,
        &task.region.name,
        task.region.bounds,
        task.scale,
        &job.grid,
        valid_pixels,
        task.resample,
    );

    // write next to the destination, then move into place
    let staging = tempfile::Builder::new()
        .prefix(&format!(".{}_", task.description))
        .suffix(".tif")
        .tempfile_in(dir)?;
    {
        let mut ds = write_tiff_f32(staging.path(), &job.grid, &band.name, data)?;
        embed_tiff_metadata(&mut ds, &meta.tiff_items())?;
    }
    staging
        .persist(destination)
        .map_err(|e| Error::Export(format!("could not move export into place: {}", e)))?;
    create_metadata_sidecar(destination, &meta).map_err(|e| Error::Export(e.to_string()))?;
    Ok(())
}

/// Validates and logs exports without writing anything
#[derive(Debug, Default)]
pub struct DryRunSink {
    next_id: AtomicU64,
}

impl ExportSink for DryRunSink {
    fn submit(&self, task: ExportTask) -> Result<JobHandle> {
        let grid = task.output_grid()?;
        let handle = JobHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            description: task.description.clone(),
            destination: PathBuf::from(&task.folder).join(format!("{}.tif", task.description)),
        };
        info!(
            "[dry-run] {} -> {:?}: {}x{} px on {} at {} m",
            handle.description, handle.destination, grid.width, grid.height, grid.crs, task.scale
        );
        Ok(handle)
    }
}
