//! Value parsers: raw attribute text to normalized numbers

use crate::resolver::read_first_line;
use sens_capture_core::constants::{MICROVOLTS_ATTR, MILLI_SCALE, SCALING_CUR_FREQ_ATTR, TEMP_ATTR};
use sens_capture_core::{Sample, SensorError, SensorKind, SysfsReader};
use std::path::Path;

/// Thermal zone temperature in degrees Celsius (`temp` is in millidegrees)
pub fn parse_celsius(reader: &dyn SysfsReader, zone_path: &Path) -> Result<Sample, SensorError> {
    let millidegrees = read_number(reader, &zone_path.join(TEMP_ATTR))?;
    Ok(millidegrees / MILLI_SCALE)
}

/// Current CPU frequency, exactly as reported by `cpufreq/scaling_cur_freq`
pub fn parse_hertz(reader: &dyn SysfsReader, cpu_path: &Path) -> Result<Sample, SensorError> {
    read_number(reader, &cpu_path.join(SCALING_CUR_FREQ_ATTR))
}

/// Regulator output as `microvolts / 1000`.
///
/// The result is millivolt-scaled even though the regulator panel has always
/// been labelled "volts"; the scale factor is kept as is.
pub fn parse_volts(reader: &dyn SysfsReader, regulator_path: &Path) -> Result<Sample, SensorError> {
    let microvolts = read_number(reader, &regulator_path.join(MICROVOLTS_ATTR))?;
    Ok(microvolts / MILLI_SCALE)
}

/// Dispatch to the parser for `kind`
pub fn parse_for(reader: &dyn SysfsReader, kind: SensorKind, path: &Path) -> Result<Sample, SensorError> {
    match kind {
        SensorKind::Thermal => parse_celsius(reader, path),
        SensorKind::Regulator => parse_volts(reader, path),
        SensorKind::CpuFrequency => parse_hertz(reader, path),
    }
}

/// First line of `path` as a finite decimal number (integers, `45500.0`
/// and exponent notation all qualify)
fn read_number(reader: &dyn SysfsReader, path: &Path) -> Result<f64, SensorError> {
    let text = read_first_line(reader, path).map_err(|e| match e {
        SensorError::AttributeMissing { path, source } => SensorError::Parse {
            path,
            detail: source.to_string(),
        },
        other => other,
    })?;

    if text.is_empty() {
        return Err(SensorError::Parse {
            path: path.to_path_buf(),
            detail: "empty value".to_string(),
        });
    }

    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SensorError::Parse {
            path: path.to_path_buf(),
            detail: format!("expected a number, got '{text}'"),
        }),
    }
}
