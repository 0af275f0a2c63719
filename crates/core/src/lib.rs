//! sens-capture-core: Core building blocks for sens-capture.
//!
//! This crate contains the sysfs access seam ([`SysfsReader`]), the
//! sensor registry, the per-sensor time-series store, the error type and
//! shared constants.

pub mod constants;
mod error;
mod registry;
mod series;
mod sysfs;
mod timeout;

pub use error::SensorError;
pub use registry::SensorRegistry;
pub use series::{SeriesView, Store, StoreReader, StoreWriter, TimeSeries};
pub use sysfs::{MemorySysfs, RealSysfs, SysfsReader};
pub use timeout::TimeoutReader;

// Re-export types used in public signatures for convenience
pub use sens_capture_types::{Sample, SamplerConfig, SensorDescriptor, SensorKind};
