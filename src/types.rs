//! Shared types and constants used across sifdown.
//! Includes `ResampleKind`, the band names every stage agrees on, and the
//! fixed unit-conversion constant applied to the reconstructed signal.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// MCD43A4 nadir BRDF-adjusted red reflectance
pub const BAND_RED: &str = "Nadir_Reflectance_Band1";
/// MCD43A4 nadir BRDF-adjusted near-infrared reflectance
pub const BAND_NIR: &str = "Nadir_Reflectance_Band2";
pub const BAND_NIRV: &str = "NIRv";
pub const BAND_SIF: &str = "SIF";
pub const BAND_RATIO: &str = "Ratio";
pub const BAND_SIF_RE: &str = "SIF_RE";

/// TROPOMI SIF assets are stored scaled; dividing by this yields mW m-2 sr-1 nm-1.
pub const SIF_UNIT_DIVISOR: f64 = 1000.0;

/// Metres per degree of longitude at the equator, used to express a metric
/// export scale on a geographic grid.
pub const METERS_PER_DEGREE: f64 = 111_319.490_793_273_57;

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResampleKind {
    Nearest,
    #[default]
    Bilinear,
}

impl std::fmt::Display for ResampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResampleKind::Nearest => "nearest",
            ResampleKind::Bilinear => "bilinear",
        };
        write!(f, "{}", s)
    }
}
