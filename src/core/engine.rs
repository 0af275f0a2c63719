//! Engine: discovered sensors plus the sampler that fills their series

use log::{info, warn};
use sens_capture_core::{
    RealSysfs, SamplerConfig, SensorRegistry, SeriesView, StoreReader, SysfsReader, TimeoutReader,
};
use sens_capture_sources::{discover, ErrorSink, Sampler, TickSummary};
use std::sync::Arc;
use std::time::Duration;

/// Owns the sensor registry and the sampler (and through it the store).
///
/// Built once at startup; the sensor set does not change afterwards.
pub struct Engine {
    registry: Arc<SensorRegistry>,
    sampler: Sampler,
    sampling_period: Duration,
}

impl Engine {
    /// Discover sensors on the real sysfs and prepare empty series
    pub fn new(config: &SamplerConfig) -> Self {
        Self::with_reader(Arc::new(RealSysfs), config)
    }

    /// Discover sensors through `reader` and prepare empty series.
    ///
    /// Sampling reads are bounded by `config.read_timeout_ms` when set.
    pub fn with_reader(reader: Arc<dyn SysfsReader>, config: &SamplerConfig) -> Self {
        let registry = Arc::new(discover(reader.as_ref(), &config.sysfs_root));
        let sampling_reader = sampling_reader(reader, config.read_timeout());

        info!(
            "Sampling {} sensors every {:?}{}",
            registry.len(),
            config.sampling_period(),
            match config.history_capacity {
                Some(capacity) => format!(", keeping the last {} samples", capacity),
                None => String::new(),
            }
        );

        let sampler = Sampler::new(Arc::clone(&registry), sampling_reader, config.history_capacity);
        Self {
            registry,
            sampler,
            sampling_period: config.sampling_period(),
        }
    }

    /// Replace the sampler's error sink
    pub fn with_error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sampler = self.sampler.with_error_sink(sink);
        self
    }

    pub fn registry(&self) -> &Arc<SensorRegistry> {
        &self.registry
    }

    /// Read-only handle for renderers
    pub fn store_reader(&self) -> StoreReader {
        self.sampler.store_reader()
    }

    pub fn sampling_period(&self) -> Duration {
        self.sampling_period
    }

    /// Sample every sensor once
    pub fn tick(&mut self) -> TickSummary {
        self.sampler.tick()
    }

    /// Every series paired with its descriptor, ordered by sensor path
    pub fn snapshot(&self) -> Vec<SeriesView> {
        self.store_reader().views(&self.registry)
    }

    pub(crate) fn into_sampler(self) -> Sampler {
        self.sampler
    }
}

fn sampling_reader(reader: Arc<dyn SysfsReader>, timeout: Option<Duration>) -> Arc<dyn SysfsReader> {
    let Some(timeout) = timeout else {
        return reader;
    };
    match TimeoutReader::new(Arc::clone(&reader), timeout) {
        Ok(bounded) => {
            log::debug!("Sensor reads time out after {:?}", bounded.timeout());
            Arc::new(bounded)
        }
        Err(e) => {
            warn!("Could not start sysfs reader thread, reads will not time out: {}", e);
            reader
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sens_capture_core::{MemorySysfs, SensorKind};
    use std::path::{Path, PathBuf};

    fn fixture() -> Arc<MemorySysfs> {
        Arc::new(
            MemorySysfs::new()
                .with_file("/sys/class/thermal/thermal_zone0/type", "cpu-thermal")
                .with_file("/sys/class/thermal/thermal_zone0/temp", "51540")
                .with_file("/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq", "1500000")
                .with_file("/sys/devices/system/cpu/cpu1/cpufreq/scaling_cur_freq", "1500000"),
        )
    }

    #[test]
    fn test_new_builds_registry_and_empty_store() {
        let engine = Engine::with_reader(fixture(), &SamplerConfig::default());
        assert_eq!(engine.registry().len(), 3);
        assert_eq!(engine.registry().count(SensorKind::Regulator), 0);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|view| view.samples.is_empty()));
        assert_eq!(engine.sampling_period(), Duration::from_millis(100));
    }

    #[test]
    fn test_tick_through_timeout_reader() {
        let config = SamplerConfig {
            read_timeout_ms: Some(1000),
            ..Default::default()
        };
        let mut engine = Engine::with_reader(fixture(), &config);
        for _ in 0..3 {
            engine.tick();
        }

        let reader = engine.store_reader();
        assert_eq!(
            reader.snapshot(Path::new("/sys/class/thermal/thermal_zone0")),
            Some(vec![51.54, 51.54, 51.54])
        );
        let paths: Vec<PathBuf> = engine
            .snapshot()
            .into_iter()
            .map(|view| view.descriptor.path().to_path_buf())
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/sys/class/thermal/thermal_zone0"),
                PathBuf::from("/sys/devices/system/cpu/cpu0"),
                PathBuf::from("/sys/devices/system/cpu/cpu1"),
            ]
        );
    }

    #[test]
    fn test_custom_root() {
        let fs = Arc::new(
            MemorySysfs::new()
                .with_file("/mnt/target/class/thermal/thermal_zone0/type", "soc")
                .with_file("/mnt/target/class/thermal/thermal_zone0/temp", "30000"),
        );
        let config = SamplerConfig {
            sysfs_root: PathBuf::from("/mnt/target"),
            read_timeout_ms: None,
            ..Default::default()
        };
        let mut engine = Engine::with_reader(fs, &config);
        assert_eq!(engine.registry().len(), 1);
        assert_eq!(engine.tick().sampled, 1);
    }
}
