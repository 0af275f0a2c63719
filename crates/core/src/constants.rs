//! Shared constants for sysfs layout and unit scaling

/// Directory holding `thermal_zone*` entries, relative to the sysfs root
pub const THERMAL_CLASS_DIR: &str = "class/thermal";

/// Name prefix of a thermal zone directory
pub const THERMAL_ZONE_PREFIX: &str = "thermal_zone";

/// Directory holding `regulator.*` entries, relative to the sysfs root
pub const REGULATOR_CLASS_DIR: &str = "class/regulator";

/// Name prefix of a regulator directory
pub const REGULATOR_PREFIX: &str = "regulator.";

/// Directory holding the `cpu*` entries, relative to the sysfs root
pub const CPU_DEVICES_DIR: &str = "devices/system/cpu";

/// Name prefix of a CPU directory
pub const CPU_PREFIX: &str = "cpu";

/// Frequency scaling subdirectory of a CPU directory
pub const CPUFREQ_DIR: &str = "cpufreq";

/// Sensor type string (thermal zones, regulators)
pub const TYPE_ATTR: &str = "type";

/// Regulator name
pub const NAME_ATTR: &str = "name";

/// Thermal zone temperature in millidegrees Celsius
pub const TEMP_ATTR: &str = "temp";

/// Regulator output in microvolts; also the regulator eligibility marker
pub const MICROVOLTS_ATTR: &str = "microvolts";

/// Current CPU frequency, relative to the CPU directory
pub const SCALING_CUR_FREQ_ATTR: &str = "cpufreq/scaling_cur_freq";

/// Divisor applied to millidegree and microvolt readings
pub const MILLI_SCALE: f64 = 1000.0;
