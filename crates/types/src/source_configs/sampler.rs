//! Sampler configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys")
}

fn default_sampling_period() -> u64 {
    100 // 10 samples per second
}

fn default_read_timeout() -> Option<u64> {
    Some(50)
}

/// Configuration for discovery and the sampling loop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplerConfig {
    /// Mount point of the sysfs tree
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    #[serde(default = "default_sampling_period")]
    pub sampling_period_ms: u64,
    /// Deadline for a single attribute read while sampling (None = no deadline)
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: Option<u64>,
    /// Maximum samples kept per sensor (None = keep everything)
    #[serde(default)]
    pub history_capacity: Option<usize>,
}

impl SamplerConfig {
    pub fn sampling_period(&self) -> Duration {
        // A zero period would make the interval timer panic
        Duration::from_millis(self.sampling_period_ms.max(1))
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sysfs_root: default_sysfs_root(),
            sampling_period_ms: default_sampling_period(),
            read_timeout_ms: default_read_timeout(),
            history_capacity: None,
        }
    }
}
