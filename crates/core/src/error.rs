//! Error types for sensor discovery and sampling.

use std::path::PathBuf;

/// Errors that can occur while resolving or reading a sensor.
///
/// Neither variant is fatal: discovery drops the one candidate that raised
/// `AttributeMissing`, and sampling skips the one sensor that raised `Parse`
/// for the current tick.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// A metadata or value attribute file is absent or unreadable.
    #[error("attribute missing: {}: {source}", .path.display())]
    AttributeMissing {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A value attribute could not be turned into a number
    /// (missing, empty, non-numeric, or the read timed out).
    #[error("failed to parse {}: {detail}", .path.display())]
    Parse { path: PathBuf, detail: String },
}

impl SensorError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            SensorError::AttributeMissing { path, .. } => path,
            SensorError::Parse { path, .. } => path,
        }
    }
}
