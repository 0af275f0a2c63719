//! sens-capture-types: Shared data types for sens-capture.
//!
//! This crate contains pure data types (sensor descriptors, kinds and
//! configuration) shared across all sens-capture crates. It performs no
//! I/O, making it suitable as a foundation layer.

pub mod sensor;
pub mod source_configs;

// Re-export commonly used types at the crate root for convenience
pub use sensor::{Sample, SensorDescriptor, SensorKind};
pub use source_configs::SamplerConfig;
