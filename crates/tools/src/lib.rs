//! Command-line plumbing shared by the Taxi Trips binaries.

pub mod cli;
pub mod config;
pub mod csv_io;

pub use config::PipelineConfig;
