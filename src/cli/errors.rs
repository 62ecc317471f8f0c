use std::path::PathBuf;
use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("{arg} is not a directory: {path:?}")]
    NotADirectory { arg: String, path: PathBuf },

    #[error(transparent)]
    Downscale(#[from] sifdown::Error),
}
