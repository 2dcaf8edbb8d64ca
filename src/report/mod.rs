//! Report module - automated profiling report generation

mod charts;
mod generator;
pub mod job;
pub mod profile;

pub use charts::ChartRenderer;
pub use generator::{ReportArtifact, ReportGenerator};
pub use job::{CancellationToken, ReportProgress, ReportSlot, ReportStatus, RunningJob};
pub use profile::{DatasetProfile, Profiler};

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report generation was cancelled")]
    Cancelled,
    #[error("Failed to profile data: {0}")]
    Data(#[from] PolarsError),
    #[error("Failed to draw chart: {0}")]
    Chart(String),
    #[error("Failed to render report: {0}")]
    Template(#[from] minijinja::Error),
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Report worker stopped unexpectedly: {0}")]
    Worker(String),
}
