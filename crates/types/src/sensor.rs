//! Sensor identity types shared by discovery, sampling and rendering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Kind of sysfs sensor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorKind {
    #[serde(rename = "thermal")]
    Thermal,
    #[serde(rename = "regulator")]
    Regulator,
    #[serde(rename = "cpu_frequency")]
    CpuFrequency,
}

impl SensorKind {
    /// All kinds, in panel order
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Thermal,
        SensorKind::Regulator,
        SensorKind::CpuFrequency,
    ];

    /// Unit label of the normalized value.
    ///
    /// Regulators report microvolts / 1000, which is millivolt-scaled even
    /// though it has always been labelled "volts".
    pub fn unit_label(&self) -> &'static str {
        match self {
            SensorKind::Thermal => "Celsius",
            SensorKind::Regulator => "volts",
            SensorKind::CpuFrequency => "Hz",
        }
    }

    /// Title of the panel that shows every sensor of this kind
    pub fn panel_title(&self) -> &'static str {
        match self {
            SensorKind::Thermal => "Thermal zones (Celsius)",
            SensorKind::Regulator => "Regulators (volts)",
            SensorKind::CpuFrequency => "CPU Frequency (Hz)",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorKind::Thermal => "thermal",
            SensorKind::Regulator => "regulator",
            SensorKind::CpuFrequency => "cpu_frequency",
        };
        f.write_str(name)
    }
}

/// A discovered sensor.
///
/// Identity is the path alone: equality, ordering and hashing ignore the
/// kind and caption, so two descriptors with the same path are the same
/// sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorDescriptor {
    path: PathBuf,
    kind: SensorKind,
    caption: String,
}

impl SensorDescriptor {
    pub fn new(path: impl Into<PathBuf>, kind: SensorKind, caption: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            caption: caption.into(),
        }
    }

    /// Sensor directory (for CPU frequency domains, the `cpuN` directory)
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Human-readable legend text
    pub fn caption(&self) -> &str {
        &self.caption
    }
}

impl PartialEq for SensorDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for SensorDescriptor {}

impl Hash for SensorDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialOrd for SensorDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SensorDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

/// A single normalized measurement; its position in the series is its timestamp
pub type Sample = f64;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_descriptor_identity_is_path() {
        let a = SensorDescriptor::new("/sys/class/thermal/thermal_zone0", SensorKind::Thermal, "a");
        let b = SensorDescriptor::new("/sys/class/thermal/thermal_zone0", SensorKind::Thermal, "b");
        let c = SensorDescriptor::new("/sys/class/thermal/thermal_zone1", SensorKind::Thermal, "a");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&SensorKind::CpuFrequency).unwrap();
        assert_eq!(json, "\"cpu_frequency\"");

        let kind: SensorKind = serde_json::from_str("\"regulator\"").unwrap();
        assert_eq!(kind, SensorKind::Regulator);
    }

    #[test]
    fn test_panel_titles() {
        assert_eq!(SensorKind::Thermal.panel_title(), "Thermal zones (Celsius)");
        assert_eq!(SensorKind::Regulator.panel_title(), "Regulators (volts)");
        assert_eq!(SensorKind::CpuFrequency.panel_title(), "CPU Frequency (Hz)");
        for kind in SensorKind::ALL {
            assert!(kind.panel_title().contains(kind.unit_label()));
        }
    }
}
