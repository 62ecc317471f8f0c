pub mod composite;
pub mod downscale;
pub mod index;
pub mod ops;
pub mod pipeline;
pub mod resample;
