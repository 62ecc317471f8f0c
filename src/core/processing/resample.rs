//! Resample + reproject onto a target grid. Target pixel centres are mapped
//! into the source CRS (through GDAL when the CRSs differ), then into source
//! pixel space, and each band is sampled there.
use ndarray::{Array2, Zip};
use tracing::debug;

use crate::core::raster::{Grid, Image};
use crate::error::Result;
use crate::io::gdal::GdalCrsTransform;
use crate::types::ResampleKind;

/// Resample + reproject capability
pub trait Resampler {
    fn reproject(&self, image: &Image, target: &Grid, kind: ResampleKind) -> Result<Image>;
}

/// In-process resampler over `Grid`s
#[derive(Debug, Default, Clone, Copy)]
pub struct GridResampler;

impl Resampler for GridResampler {
    fn reproject(&self, image: &Image, target: &Grid, kind: ResampleKind) -> Result<Image> {
        debug!(
            "Reprojecting {} ({}x{} {}) -> {}x{} {} [{}]",
            image.id,
            image.grid.width,
            image.grid.height,
            image.grid.crs,
            target.width,
            target.height,
            target.crs,
            kind
        );
        let (px, py) = source_pixel_coordinates(&image.grid, target)?;

        let mut out = Image::new(image.id.clone(), image.date, target.clone());
        for band in image.bands() {
            let src = &band.data;
            let mut resampled = Array2::from_elem(target.shape(), f64::NAN);
            Zip::from(&mut resampled)
                .and(&px)
                .and(&py)
                .par_for_each(|o, &x, &y| {
                    *o = match kind {
                        ResampleKind::Bilinear => sample_bilinear(src, x, y),
                        ResampleKind::Nearest => sample_nearest(src, x, y),
                    };
                });
            out = out.with_band(band.name.clone(), resampled)?;
        }
        Ok(out)
    }
}

/// Fractional source pixel coordinates (origin at the top-left corner of the
/// source raster) of every target pixel centre.
fn source_pixel_coordinates(source: &Grid, target: &Grid) -> Result<(Array2<f64>, Array2<f64>)> {
    let n = target.width * target.height;
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for row in 0..target.height {
        for col in 0..target.width {
            let (x, y) = target.pixel_center(col, row);
            xs.push(x);
            ys.push(y);
        }
    }

    if !target.same_crs(source) {
        GdalCrsTransform::new(&target.crs, &source.crs)?.transform(&mut xs, &mut ys)?;
    }

    let inv = source.inverse_geotransform()?;
    let shape = target.shape();
    let mut px = Array2::zeros(shape);
    let mut py = Array2::zeros(shape);
    for (i, (x, y)) in xs.into_iter().zip(ys).enumerate() {
        let idx = (i / target.width, i % target.width);
        if x.is_finite() && y.is_finite() {
            px[idx] = inv[0] + inv[1] * x + inv[2] * y;
            py[idx] = inv[3] + inv[4] * x + inv[5] * y;
        } else {
            px[idx] = f64::NAN;
            py[idx] = f64::NAN;
        }
    }
    Ok((px, py))
}

fn outside(src: &Array2<f64>, x: f64, y: f64) -> bool {
    let (rows, cols) = src.dim();
    !(x >= 0.0 && y >= 0.0 && x <= cols as f64 && y <= rows as f64) || rows == 0 || cols == 0
}

/// Bilinear sample between the four nearest pixel centres. Within half a
/// pixel of the raster edge the edge row/column is reused. Any contributing
/// neighbour that is no-data makes the result no-data.
pub fn sample_bilinear(src: &Array2<f64>, x: f64, y: f64) -> f64 {
    if outside(src, x, y) {
        return f64::NAN;
    }
    let (rows, cols) = src.dim();
    let u = (x - 0.5).clamp(0.0, (cols - 1) as f64);
    let v = (y - 0.5).clamp(0.0, (rows - 1) as f64);

    let x1 = u.floor() as usize;
    let y1 = v.floor() as usize;
    let x2 = (x1 + 1).min(cols - 1);
    let y2 = (y1 + 1).min(rows - 1);
    let dx = u - x1 as f64;
    let dy = v - y1 as f64;

    let taps = [
        (src[[y1, x1]], (1.0 - dx) * (1.0 - dy)),
        (src[[y1, x2]], dx * (1.0 - dy)),
        (src[[y2, x1]], (1.0 - dx) * dy),
        (src[[y2, x2]], dx * dy),
    ];
    let mut acc = 0.0;
    for (value, weight) in taps {
        if weight == 0.0 {
            continue;
        }
        if value.is_nan() {
            return f64::NAN;
        }
        acc += value * weight;
    }
    acc
}

pub fn sample_nearest(src: &Array2<f64>, x: f64, y: f64) -> f64 {
    if outside(src, x, y) {
        return f64::NAN;
    }
    let (rows, cols) = src.dim();
    let col = (x.floor() as usize).min(cols - 1);
    let row = (y.floor() as usize).min(rows - 1);
    src[[row, col]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn coarse() -> Grid {
        Grid::new("EPSG:4326", [0.0, 1.0, 0.0, 2.0, 0.0, -1.0], 2, 2)
    }

    fn fine() -> Grid {
        Grid::new("EPSG:4326", [0.0, 0.5, 0.0, 2.0, 0.0, -0.5], 4, 4)
    }

    fn image(grid: Grid, data: Array2<f64>) -> Image {
        Image::new("t", None, grid).with_band("v", data).unwrap()
    }

    #[test]
    fn same_grid_is_identity() {
        let data = array![[1.0, 2.0], [3.0, f64::NAN]];
        let out = GridResampler
            .reproject(&image(coarse(), data), &coarse(), ResampleKind::Bilinear)
            .unwrap();
        let b = out.band("v").unwrap();
        assert_eq!(b[[0, 0]], 1.0);
        assert_eq!(b[[0, 1]], 2.0);
        assert_eq!(b[[1, 0]], 3.0);
        assert!(b[[1, 1]].is_nan());
    }

    #[test]
    fn bilinear_upsampling_interpolates_between_centres() {
        let data = array![[1.2, 2.4], [3.6, 4.8]];
        let out = GridResampler
            .reproject(&image(coarse(), data), &fine(), ResampleKind::Bilinear)
            .unwrap();
        let b = out.band("v").unwrap();
        // corner pixels sit within half a coarse pixel of the edge
        assert!((b[[0, 0]] - 1.2).abs() < 1e-12);
        assert!((b[[3, 3]] - 4.8).abs() < 1e-12);
        // centre offset (0.25, 0.25) from the top-left coarse centre
        assert!((b[[1, 1]] - 2.1).abs() < 1e-12);
        assert!((b[[0, 1]] - (1.2 * 0.75 + 2.4 * 0.25)).abs() < 1e-12);
    }

    #[test]
    fn nearest_picks_containing_pixel() {
        let data = array![[1.0, 2.0], [3.0, 4.0]];
        let out = GridResampler
            .reproject(&image(coarse(), data), &fine(), ResampleKind::Nearest)
            .unwrap();
        let b = out.band("v").unwrap();
        assert_eq!(b[[1, 1]], 1.0);
        assert_eq!(b[[1, 2]], 2.0);
        assert_eq!(b[[2, 1]], 3.0);
    }

    #[test]
    fn outside_source_extent_is_no_data() {
        let shifted = Grid::new("EPSG:4326", [5.0, 1.0, 0.0, 2.0, 0.0, -1.0], 2, 2);
        let out = GridResampler
            .reproject(&image(coarse(), Array2::ones((2, 2))), &shifted, ResampleKind::Bilinear)
            .unwrap();
        assert_eq!(out.valid_count("v").unwrap(), 0);
    }

    #[test]
    fn no_data_neighbour_poisons_bilinear() {
        let data = array![[1.0, f64::NAN], [3.0, 4.0]];
        assert!(sample_bilinear(&data, 1.0, 1.0).is_nan());
        assert_eq!(sample_bilinear(&data, 0.5, 1.0), 2.0);
    }

    #[test]
    fn reprojects_sinusoidal_source_onto_geographic_grid() {
        let sinu = "+proj=sinu +lon_0=0 +x_0=0 +y_0=0 +R=6371007.181 +units=m +no_defs";
        let target = Grid::new("EPSG:4326", [10.0, 0.01, 0.0, 45.0, 0.0, -0.01], 5, 5);

        let mut cx = vec![10.0, 10.05, 10.0, 10.05];
        let mut cy = vec![45.0, 45.0, 44.95, 44.95];
        let to_sinu = GdalCrsTransform::new("EPSG:4326", sinu).unwrap();
        to_sinu.transform(&mut cx, &mut cy).unwrap();
        let margin = 5_000.0;
        let pixel = 1_000.0;
        let min_x = cx.iter().cloned().fold(f64::INFINITY, f64::min) - margin;
        let max_x = cx.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + margin;
        let min_y = cy.iter().cloned().fold(f64::INFINITY, f64::min) - margin;
        let max_y = cy.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + margin;
        let cols = ((max_x - min_x) / pixel).ceil() as usize;
        let rows = ((max_y - min_y) / pixel).ceil() as usize;
        let source = Grid::new(sinu, [min_x, pixel, 0.0, max_y, 0.0, -pixel], cols, rows);

        // easting of every source pixel centre; bilinear reproduces it exactly
        let easting = Array2::from_shape_fn((rows, cols), |(r, c)| source.pixel_center(c, r).0);
        let out = GridResampler
            .reproject(&image(source, easting), &target, ResampleKind::Bilinear)
            .unwrap();
        let b = out.band("v").unwrap();
        assert_eq!(out.grid, target);
        assert_eq!(out.valid_count("v").unwrap(), 25);

        for row in 0..target.height {
            for col in 0..target.width {
                let (lon, lat) = target.pixel_center(col, row);
                let (mut x, mut y) = ([lon], [lat]);
                to_sinu.transform(&mut x, &mut y).unwrap();
                assert!((b[[row, col]] - x[0]).abs() < 1e-6, "pixel ({}, {})", col, row);
            }
        }
    }
}
