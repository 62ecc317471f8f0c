use ndarray::Array2;

use sifdown::core::processing::resample::{GridResampler, Resampler};
use sifdown::io::gdal::{GdalCrsTransform, is_geographic};
use sifdown::io::writers::tiff::write_tiff_f32;
use sifdown::{GdalRasterReader, Grid, Image, ResampleKind};

/// Projection string GDAL writes for MCD43A4 tiles
const MODIS_SINUSOIDAL_WKT: &str = r#"PROJCS["unnamed",GEOGCS["Unknown datum based upon the custom spheroid",DATUM["Not specified (based on custom spheroid)",SPHEROID["Custom spheroid",6371007.181,0]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]]],PROJECTION["Sinusoidal"],PARAMETER["longitude_of_center",0],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH]]"#;

/// 500 m sinusoidal grid covering a small lon/lat box with a 3 km margin
fn sinusoidal_tile(lon: (f64, f64), lat: (f64, f64)) -> Grid {
    let mut xs = [lon.0, lon.1, lon.0, lon.1];
    let mut ys = [lat.1, lat.1, lat.0, lat.0];
    GdalCrsTransform::new("EPSG:4326", MODIS_SINUSOIDAL_WKT)
        .unwrap()
        .transform(&mut xs, &mut ys)
        .unwrap();
    let margin = 3_000.0;
    let pixel = 463.312716528;
    let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min) - margin;
    let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + margin;
    let min_y = ys.iter().cloned().fold(f64::INFINITY, f64::min) - margin;
    let max_y = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + margin;
    Grid::new(
        MODIS_SINUSOIDAL_WKT,
        [min_x, pixel, 0.0, max_y, 0.0, -pixel],
        ((max_x - min_x) / pixel).ceil() as usize,
        ((max_y - min_y) / pixel).ceil() as usize,
    )
}

#[test]
fn sinusoidal_geotiff_keeps_its_projection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MCD43A4_A2018213.tif");
    let grid = sinusoidal_tile((-72.70, -72.65), (41.55, 41.60));
    let data = Array2::from_elem(grid.shape(), 0.25);
    drop(write_tiff_f32(&path, &grid, "NIRv", &data).unwrap());

    let reader = GdalRasterReader::open(&path).unwrap();
    let crs = reader.grid().crs;
    assert!(!crs.starts_with("EPSG:"), "collapsed to {}", crs);
    assert!(!is_geographic(&crs).unwrap());
    assert_eq!(reader.grid().shape(), grid.shape());
}

#[test]
fn sinusoidal_tile_reprojects_to_wgs84() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MCD43A4_A2018213.tif");
    let grid = sinusoidal_tile((-72.70, -72.65), (41.55, 41.60));
    let data = Array2::from_elem(grid.shape(), 0.25);
    drop(write_tiff_f32(&path, &grid, "NIRv", &data).unwrap());

    let reader = GdalRasterReader::open(&path).unwrap();
    let tile = Image::new("MCD43A4_A2018213", None, reader.grid())
        .with_band("NIRv", reader.read_band(1).unwrap())
        .unwrap();

    let target = Grid::new("EPSG:4326", [-72.70, 0.01, 0.0, 41.60, 0.0, -0.01], 5, 5);
    let out = GridResampler
        .reproject(&tile, &target, ResampleKind::Bilinear)
        .unwrap();
    assert_eq!(out.grid.crs, "EPSG:4326");
    assert_eq!(out.valid_count("NIRv").unwrap(), 25);
    for v in out.band("NIRv").unwrap() {
        assert!((v - 0.25).abs() < 1e-9);
    }

    // a target box far east of the tile falls outside it
    let elsewhere = Grid::new("EPSG:4326", [-60.0, 0.01, 0.0, 41.60, 0.0, -0.01], 5, 5);
    let out = GridResampler
        .reproject(&tile, &elsewhere, ResampleKind::Bilinear)
        .unwrap();
    assert_eq!(out.valid_count("NIRv").unwrap(), 0);
}
