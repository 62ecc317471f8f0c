//! Region selection from a GeoJSON gazetteer (e.g. a TIGER states export).
//! Features are parsed with the `geojson` crate; only the geometry's bounds
//! are needed downstream.
use geojson::{FeatureCollection, GeoJson, Geometry, Value as GeoJsonValue};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Axis-aligned bounds in the gazetteer's CRS (WGS84 lon/lat for GeoJSON)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    fn of_point(position: &[f64]) -> Option<Self> {
        match position {
            [x, y, ..] => Some(Bounds {
                min_x: *x,
                min_y: *y,
                max_x: *x,
                max_y: *y,
            }),
            _ => None,
        }
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// A named clip geometry
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    pub geometry: Option<Geometry>,
    /// `None` when the geometry is null or has no coordinates
    pub bounds: Option<Bounds>,
}

impl Region {
    pub fn new(name: impl Into<String>, geometry: Option<Geometry>) -> Self {
        let bounds = geometry.as_ref().and_then(geometry_bounds);
        Self {
            name: name.into(),
            geometry,
            bounds,
        }
    }

    /// Rectangle region, handy for ad-hoc clips
    pub fn from_bounds(name: impl Into<String>, b: Bounds) -> Self {
        let ring = vec![
            vec![b.min_x, b.min_y],
            vec![b.max_x, b.min_y],
            vec![b.max_x, b.max_y],
            vec![b.min_x, b.max_y],
            vec![b.min_x, b.min_y],
        ];
        Self::new(name, Some(Geometry::new(GeoJsonValue::Polygon(vec![ring]))))
    }

    pub fn is_empty(&self) -> bool {
        !self.bounds.map(|b| b.has_area()).unwrap_or(false)
    }
}

/// Named-region lookup
pub trait Gazetteer {
    fn lookup(&self, name: &str) -> Result<Region>;
}

/// GeoJSON `FeatureCollection` keyed by one string property
#[derive(Debug, Clone)]
pub struct GeoJsonGazetteer {
    pub path: PathBuf,
    pub name_field: String,
    collection: FeatureCollection,
}

impl GeoJsonGazetteer {
    pub fn open<P: AsRef<Path>>(path: P, name_field: impl Into<String>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let collection = match content.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection,
            _ => {
                return Err(Error::InvalidArgument {
                    arg: "regions",
                    value: format!("{} is not a GeoJSON FeatureCollection", path.as_ref().display()),
                });
            }
        };
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            name_field: name_field.into(),
            collection,
        })
    }
}

impl Gazetteer for GeoJsonGazetteer {
    fn lookup(&self, name: &str) -> Result<Region> {
        let feature = self
            .collection
            .features
            .iter()
            .find(|f| f.property(&self.name_field).and_then(|v| v.as_str()) == Some(name))
            .ok_or_else(|| Error::RegionNotFound {
                name: name.to_string(),
            })?;
        let region = Region::new(name, feature.geometry.clone());
        match region.bounds {
            Some(b) => info!(
                "Region {}: [{:.4}, {:.4}] x [{:.4}, {:.4}]",
                name, b.min_x, b.max_x, b.min_y, b.max_y
            ),
            None => warn!("Region {} has an empty geometry", name),
        }
        Ok(region)
    }
}

fn positions_bounds<'a>(positions: impl IntoIterator<Item = &'a Vec<f64>>) -> Option<Bounds> {
    positions
        .into_iter()
        .filter_map(|p| Bounds::of_point(p))
        .reduce(Bounds::union)
}

/// Bounds over every position of a GeoJSON geometry
pub fn geometry_bounds(geometry: &Geometry) -> Option<Bounds> {
    match &geometry.value {
        GeoJsonValue::Point(p) => Bounds::of_point(p),
        GeoJsonValue::MultiPoint(points) | GeoJsonValue::LineString(points) => {
            positions_bounds(points)
        }
        GeoJsonValue::MultiLineString(lines) | GeoJsonValue::Polygon(lines) => {
            positions_bounds(lines.iter().flatten())
        }
        GeoJsonValue::MultiPolygon(polygons) => {
            positions_bounds(polygons.iter().flatten().flatten())
        }
        GeoJsonValue::GeometryCollection(parts) => {
            parts.iter().filter_map(geometry_bounds).reduce(Bounds::union)
        }
    }
}
