//! Error types for report generation.

use std::path::PathBuf;

use fennec_device::DeviceError;
use thiserror::Error;

/// Failures that stop a dump as a whole.
///
/// Per-table problems are [`crate::SkipReason`]s instead.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Couldn't write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
