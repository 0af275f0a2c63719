//! Registry of discovered sensors

use sens_capture_types::{SensorDescriptor, SensorKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Discovered sensors keyed by path.
///
/// The set of sensors is fixed once built: there is no way to add or remove
/// a descriptor afterwards, so hot-plugged sensors are not picked up until
/// the process restarts.
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    sensors: BTreeMap<PathBuf, SensorDescriptor>,
}

impl SensorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered sensors
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Look up a sensor by path
    pub fn get(&self, path: &Path) -> Option<&SensorDescriptor> {
        self.sensors.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.sensors.contains_key(path)
    }

    /// All sensors, ordered by path
    pub fn iter(&self) -> impl Iterator<Item = &SensorDescriptor> {
        self.sensors.values()
    }

    /// Sensors of one kind, ordered by path
    pub fn of_kind(&self, kind: SensorKind) -> impl Iterator<Item = &SensorDescriptor> {
        self.sensors.values().filter(move |d| d.kind() == kind)
    }

    /// Number of sensors of one kind
    pub fn count(&self, kind: SensorKind) -> usize {
        self.of_kind(kind).count()
    }
}

impl FromIterator<SensorDescriptor> for SensorRegistry {
    /// Builds the registry; the first descriptor seen for a path wins.
    fn from_iter<I: IntoIterator<Item = SensorDescriptor>>(iter: I) -> Self {
        let mut sensors = BTreeMap::new();
        for descriptor in iter {
            let path = descriptor.path().to_path_buf();
            if sensors.contains_key(&path) {
                log::debug!("Ignoring duplicate sensor {}", path.display());
                continue;
            }
            sensors.insert(path, descriptor);
        }
        Self { sensors }
    }
}

impl<'a> IntoIterator for &'a SensorRegistry {
    type Item = &'a SensorDescriptor;
    type IntoIter = std::collections::btree_map::Values<'a, PathBuf, SensorDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.sensors.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SensorRegistry {
        vec![
            SensorDescriptor::new("/sys/devices/system/cpu/cpu1", SensorKind::CpuFrequency, "cpu1"),
            SensorDescriptor::new("/sys/class/thermal/thermal_zone0", SensorKind::Thermal, "thermal_zone0 (x86_pkg_temp)"),
            SensorDescriptor::new("/sys/devices/system/cpu/cpu0", SensorKind::CpuFrequency, "cpu0"),
            SensorDescriptor::new("/sys/devices/system/cpu/cpu0", SensorKind::CpuFrequency, "duplicate"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_duplicate_paths_collapse_to_first() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        let cpu0 = registry.get(Path::new("/sys/devices/system/cpu/cpu0")).unwrap();
        assert_eq!(cpu0.caption(), "cpu0");
    }

    #[test]
    fn test_queries_by_kind() {
        let registry = registry();
        assert_eq!(registry.count(SensorKind::CpuFrequency), 2);
        assert_eq!(registry.count(SensorKind::Thermal), 1);
        assert_eq!(registry.count(SensorKind::Regulator), 0);

        let captions: Vec<&str> = registry
            .of_kind(SensorKind::CpuFrequency)
            .map(|d| d.caption())
            .collect();
        assert_eq!(captions, vec!["cpu0", "cpu1"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = SensorRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains(Path::new("/sys/class/thermal/thermal_zone0")));
        assert_eq!(registry.iter().count(), 0);
    }
}
