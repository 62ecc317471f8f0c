//! Command Line Interface (CLI) layer for sifdown.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for a downscaling batch. It wires
//! user-provided options to the library functionality exposed via
//! `sifdown::api`.
//!
//! If you are embedding sifdown into another application, prefer using
//! the high-level `sifdown::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
