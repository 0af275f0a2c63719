//! Sensor discovery
//!
//! Enumerates candidate directories for each sensor kind under a sysfs root,
//! applies the kind's eligibility filter and resolves captions. Discovery
//! runs once at startup; a candidate that fails is skipped and the pass
//! carries on with the rest.

use crate::resolver::{caption, dir_name};
use sens_capture_core::constants::{
    CPUFREQ_DIR, CPU_DEVICES_DIR, CPU_PREFIX, MICROVOLTS_ATTR, REGULATOR_CLASS_DIR,
    REGULATOR_PREFIX, THERMAL_CLASS_DIR, THERMAL_ZONE_PREFIX,
};
use sens_capture_core::{SensorDescriptor, SensorKind, SensorRegistry, SysfsReader};
use std::io;
use std::path::{Path, PathBuf};

/// Candidate paths for one kind, in whatever order the directory listing
/// returned them.
///
/// - thermal: `<root>/class/thermal/thermal_zone*`
/// - regulator: `<root>/class/regulator/regulator.*`
/// - CPU frequency: `<root>/devices/system/cpu/cpu*/cpufreq` (the `cpufreq`
///   directory itself; the descriptor later uses its parent)
pub fn enumerate_candidates(reader: &dyn SysfsReader, root: &Path, kind: SensorKind) -> Vec<PathBuf> {
    let (class_dir, prefix) = match kind {
        SensorKind::Thermal => (THERMAL_CLASS_DIR, THERMAL_ZONE_PREFIX),
        SensorKind::Regulator => (REGULATOR_CLASS_DIR, REGULATOR_PREFIX),
        SensorKind::CpuFrequency => (CPU_DEVICES_DIR, CPU_PREFIX),
    };
    let class_path = root.join(class_dir);

    let entries = match reader.list_dir(&class_path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("No {} sensors: {} does not exist", kind, class_path.display());
            return Vec::new();
        }
        Err(e) => {
            log::warn!("Failed to list {}: {}", class_path.display(), e);
            return Vec::new();
        }
    };

    let matching = entries.into_iter().filter(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().starts_with(prefix))
            .unwrap_or(false)
    });

    match kind {
        SensorKind::CpuFrequency => matching
            .map(|cpu| cpu.join(CPUFREQ_DIR))
            .filter(|cpufreq| reader.exists(cpufreq))
            .collect(),
        _ => matching.collect(),
    }
}

/// Discover every sensor of every kind under `root`
pub fn discover(reader: &dyn SysfsReader, root: &Path) -> SensorRegistry {
    log::info!("=== Discovering sensors under {} ===", root.display());

    let registry: SensorRegistry = SensorKind::ALL
        .iter()
        .flat_map(|&kind| discover_kind(reader, root, kind))
        .collect();

    for kind in SensorKind::ALL {
        log::info!("  {} sensors: {}", kind, registry.count(kind));
    }
    log::info!("Sensor discovery complete: {} sensors found", registry.len());

    registry
}

/// Discover the sensors of a single kind
pub fn discover_kind(reader: &dyn SysfsReader, root: &Path, kind: SensorKind) -> Vec<SensorDescriptor> {
    let candidates = enumerate_candidates(reader, root, kind);

    let sensor_dirs: Vec<PathBuf> = match kind {
        SensorKind::CpuFrequency => candidates
            .into_iter()
            .filter_map(|cpufreq| cpufreq.parent().map(Path::to_path_buf))
            .collect(),
        _ => candidates,
    };

    let all: Vec<SensorDescriptor> = sensor_dirs
        .into_iter()
        .filter_map(|path| match caption(reader, &path, kind) {
            Ok(caption) => Some(SensorDescriptor::new(path, kind, caption)),
            Err(e) => {
                log::warn!("Skipping {} sensor {}: {}", kind, dir_name(&path), e);
                None
            }
        })
        .collect();

    let eligible: Vec<SensorDescriptor> = match kind {
        // Regulators that do not report a voltage are not plotted
        SensorKind::Regulator => all
            .into_iter()
            .filter(|d| {
                let has_voltage = reader.exists(&d.path().join(MICROVOLTS_ATTR));
                if !has_voltage {
                    log::debug!("Excluding regulator {} ({}): no microvolts", d.caption(), d.path().display());
                }
                has_voltage
            })
            .collect(),
        _ => all,
    };

    for descriptor in &eligible {
        log::info!("  [{}] {} ({})", kind, descriptor.caption(), descriptor.path().display());
    }

    eligible
}
