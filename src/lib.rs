//! sens-capture: samples sysfs hardware telemetry into per-sensor time series
//!
//! This library ties the workspace crates together:
//! - [`core::Engine`]: discovered sensors plus the sampler that fills their series
//! - [`core::UpdateManager`]: drives the sampler on a fixed period
//! - [`displayers`]: a console renderer reading store snapshots
//! - [`config`]: configuration management

pub mod config;
pub mod core;
pub mod displayers;

// Re-export commonly used types
pub use config::{AppConfig, ReportConfig};
pub use core::{Engine, UpdateManager};
