//! Caption resolution from sensor metadata attributes

use sens_capture_core::constants::{NAME_ATTR, TYPE_ATTR};
use sens_capture_core::{SensorError, SensorKind, SysfsReader};
use std::path::Path;

/// Read an attribute file and return its first line, trimmed.
///
/// An empty file yields an empty string. A missing or unreadable file is
/// `AttributeMissing`.
pub fn read_first_line(reader: &dyn SysfsReader, path: &Path) -> Result<String, SensorError> {
    let content = reader
        .read_to_string(path)
        .map_err(|source| SensorError::AttributeMissing {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(content.lines().next().unwrap_or_default().trim().to_string())
}

/// Build the human-readable caption of a sensor directory.
///
/// - thermal zone: `"<dir name> (<type>)"`
/// - regulator: `"<name> (<type>)"`
/// - CPU frequency domain: the `cpuN` directory name
pub fn caption(reader: &dyn SysfsReader, path: &Path, kind: SensorKind) -> Result<String, SensorError> {
    match kind {
        SensorKind::Thermal => {
            let zone_type = read_first_line(reader, &path.join(TYPE_ATTR))?;
            Ok(format!("{} ({})", dir_name(path), zone_type))
        }
        SensorKind::Regulator => {
            let name = read_first_line(reader, &path.join(NAME_ATTR))?;
            let regulator_type = read_first_line(reader, &path.join(TYPE_ATTR))?;
            Ok(format!("{} ({})", name, regulator_type))
        }
        SensorKind::CpuFrequency => Ok(dir_name(path)),
    }
}

/// Last path component, or the whole path if there is none
pub(crate) fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
