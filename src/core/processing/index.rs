use tracing::info;

use crate::core::processing::ops::nirv;
use crate::core::raster::{Image, ImageCollection};
use crate::error::Result;
use crate::types::{BAND_NIR, BAND_NIRV, BAND_RED};

/// Copy of `image` with an added `NIRv` band computed from red/NIR reflectance
pub fn add_nirv(image: &Image, reflectance_scale: f64) -> Result<Image> {
    let index = nirv(image.band(BAND_RED)?, image.band(BAND_NIR)?, reflectance_scale)?;
    image.clone().with_band(BAND_NIRV, index)
}

/// Map `add_nirv` over a reflectance collection
pub fn index_collection(collection: &ImageCollection, reflectance_scale: f64) -> Result<ImageCollection> {
    let indexed = collection.map(|img| add_nirv(img, reflectance_scale))?;
    info!("Computed NIRv for {} images", indexed.len());
    Ok(indexed)
}
