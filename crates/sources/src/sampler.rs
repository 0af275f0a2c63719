//! Periodic sampling of every registered sensor

use crate::parsers::parse_for;
use sens_capture_core::{
    Sample, SensorDescriptor, SensorError, SensorRegistry, Store, StoreReader, StoreWriter,
    SysfsReader,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Receives per-sensor sampling failures.
///
/// Failures never propagate out of [`Sampler::tick`]; this is where they go
/// instead.
pub trait ErrorSink: Send + Sync {
    /// `consecutive_failures` is 1 for the first failure after a success
    fn report(&self, descriptor: &SensorDescriptor, error: &SensorError, consecutive_failures: u32);
}

/// Logs the first failure of a streak as a warning and repeats at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&self, descriptor: &SensorDescriptor, error: &SensorError, consecutive_failures: u32) {
        if consecutive_failures == 1 {
            log::warn!("Failed to sample {}: {}", descriptor.caption(), error);
        } else {
            log::debug!(
                "Failed to sample {} ({} in a row): {}",
                descriptor.caption(),
                consecutive_failures,
                error
            );
        }
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickSummary {
    /// 1-based tick number
    pub tick: u64,
    /// Sensors that got a new sample
    pub sampled: usize,
    /// Sensors skipped because their read failed
    pub failed: usize,
}

/// Reads every registered sensor once per tick and appends to its series.
///
/// The sampler owns the only write handle on the store; renderers read
/// through [`Sampler::store_reader`].
pub struct Sampler {
    registry: Arc<SensorRegistry>,
    reader: Arc<dyn SysfsReader>,
    store: StoreWriter,
    sink: Box<dyn ErrorSink>,
    failure_streaks: HashMap<PathBuf, u32>,
    ticks: u64,
}

impl Sampler {
    /// Create a sampler with an empty series for every registered sensor
    pub fn new(
        registry: Arc<SensorRegistry>,
        reader: Arc<dyn SysfsReader>,
        history_capacity: Option<usize>,
    ) -> Self {
        let (store, _) = Store::new(&registry, history_capacity).into_shared();
        Self {
            registry,
            reader,
            store,
            sink: Box::new(LogSink),
            failure_streaks: HashMap::new(),
            ticks: 0,
        }
    }

    /// Replace the default [`LogSink`]
    pub fn with_error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn registry(&self) -> &Arc<SensorRegistry> {
        &self.registry
    }

    /// Read-only handle on the store
    pub fn store_reader(&self) -> StoreReader {
        self.store.reader()
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sample every sensor once.
    ///
    /// A sensor whose read fails is reported to the error sink and gets no
    /// sample this tick; the others are unaffected. All readings of the
    /// tick are committed to the store together.
    pub fn tick(&mut self) -> TickSummary {
        let registry = Arc::clone(&self.registry);
        let mut readings: Vec<(&Path, Sample)> = Vec::with_capacity(registry.len());
        let mut failed = 0;

        for descriptor in registry.iter() {
            match parse_for(self.reader.as_ref(), descriptor.kind(), descriptor.path()) {
                Ok(sample) => {
                    if let Some(streak) = self.failure_streaks.remove(descriptor.path()) {
                        log::info!(
                            "{} recovered after {} failed samples",
                            descriptor.caption(),
                            streak
                        );
                    }
                    readings.push((descriptor.path(), sample));
                }
                Err(e) => {
                    let streak = self
                        .failure_streaks
                        .entry(descriptor.path().to_path_buf())
                        .or_insert(0);
                    *streak += 1;
                    self.sink.report(descriptor, &e, *streak);
                    failed += 1;
                }
            }
        }

        let sampled = self.store.append_batch(readings);
        self.ticks += 1;

        let summary = TickSummary {
            tick: self.ticks,
            sampled,
            failed,
        };
        log::trace!("Tick {}: {} sampled, {} failed", summary.tick, sampled, failed);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover;
    use sens_capture_core::MemorySysfs;
    use std::sync::Mutex;

    const ZONE0: &str = "/sys/class/thermal/thermal_zone0";
    const ZONE1: &str = "/sys/class/thermal/thermal_zone1";
    const REGULATOR: &str = "/sys/class/regulator/regulator.0";
    const CPU0: &str = "/sys/devices/system/cpu/cpu0";

    #[derive(Clone, Default)]
    struct RecordingSink {
        reports: Arc<Mutex<Vec<(PathBuf, u32)>>>,
    }

    impl ErrorSink for RecordingSink {
        fn report(&self, descriptor: &SensorDescriptor, _error: &SensorError, consecutive_failures: u32) {
            self.reports
                .lock()
                .unwrap()
                .push((descriptor.path().to_path_buf(), consecutive_failures));
        }
    }

    fn fixture() -> Arc<MemorySysfs> {
        Arc::new(
            MemorySysfs::new()
                .with_file(format!("{ZONE0}/type"), "x86_pkg_temp")
                .with_file(format!("{ZONE0}/temp"), "45000")
                .with_file(format!("{ZONE1}/type"), "acpitz")
                .with_file(format!("{ZONE1}/temp"), "27800")
                .with_file(format!("{REGULATOR}/name"), "vdd-cpu")
                .with_file(format!("{REGULATOR}/type"), "voltage")
                .with_file(format!("{REGULATOR}/microvolts"), "1100000")
                .with_file(format!("{CPU0}/cpufreq/scaling_cur_freq"), "1800000"),
        )
    }

    fn sampler(fs: &Arc<MemorySysfs>) -> Sampler {
        let registry = Arc::new(discover(fs.as_ref(), Path::new("/sys")));
        Sampler::new(registry, fs.clone(), None)
    }

    #[test]
    fn test_n_clean_ticks_give_n_samples() {
        let fs = fixture();
        let mut sampler = sampler(&fs);
        let reader = sampler.store_reader();

        for _ in 0..7 {
            let summary = sampler.tick();
            assert_eq!(summary.sampled, 4);
            assert_eq!(summary.failed, 0);
        }

        assert_eq!(sampler.ticks(), 7);
        for descriptor in sampler.registry().iter() {
            assert_eq!(reader.len(descriptor.path()), Some(7), "{}", descriptor.caption());
        }
        assert_eq!(reader.snapshot(Path::new(ZONE0)).unwrap(), vec![45.0; 7]);
        assert_eq!(reader.last(Path::new(REGULATOR)), Some(1100.0));
        assert_eq!(reader.last(Path::new(CPU0)), Some(1_800_000.0));
    }

    #[test]
    fn test_failure_skips_only_the_failing_sensor() {
        let fs = fixture();
        let sink = RecordingSink::default();
        let mut sampler = sampler(&fs).with_error_sink(sink.clone());
        let reader = sampler.store_reader();

        sampler.tick();
        sampler.tick();

        // Tick 3 fails for zone0 only
        fs.set_file(format!("{ZONE0}/temp"), "garbage");
        let summary = sampler.tick();
        assert_eq!(summary, TickSummary { tick: 3, sampled: 3, failed: 1 });

        assert_eq!(reader.len(Path::new(ZONE0)), Some(2));
        assert_eq!(reader.len(Path::new(ZONE1)), Some(3));

        // Recovery
        fs.set_file(format!("{ZONE0}/temp"), "46000");
        sampler.tick();
        assert_eq!(reader.len(Path::new(ZONE0)), Some(3));
        assert_eq!(reader.len(Path::new(ZONE1)), Some(4));
        assert_eq!(reader.snapshot(Path::new(ZONE0)).unwrap(), vec![45.0, 45.0, 46.0]);

        let reports = sink.reports.lock().unwrap();
        assert_eq!(*reports, vec![(PathBuf::from(ZONE0), 1)]);
    }

    #[test]
    fn test_consecutive_failures_are_counted() {
        let fs = fixture();
        let sink = RecordingSink::default();
        let mut sampler = sampler(&fs).with_error_sink(sink.clone());

        fs.remove(Path::new(CPU0));
        sampler.tick();
        sampler.tick();
        sampler.tick();

        let streaks: Vec<u32> = sink.reports.lock().unwrap().iter().map(|(_, n)| *n).collect();
        assert_eq!(streaks, vec![1, 2, 3]);
    }

    #[test]
    fn test_all_sensors_failing_is_an_empty_tick() {
        let fs = fixture();
        let mut sampler = sampler(&fs);
        let reader = sampler.store_reader();

        fs.remove(Path::new("/sys"));
        let summary = sampler.tick();
        assert_eq!(summary.sampled, 0);
        assert_eq!(summary.failed, 4);
        assert!(reader.views(sampler.registry()).iter().all(|v| v.samples.is_empty()));
    }

    #[test]
    fn test_empty_registry_ticks() {
        let fs = Arc::new(MemorySysfs::new());
        let mut sampler = Sampler::new(Arc::new(SensorRegistry::new()), fs, None);
        assert_eq!(sampler.tick(), TickSummary { tick: 1, sampled: 0, failed: 0 });
    }

    #[test]
    fn test_bounded_history() {
        let fs = fixture();
        let registry = Arc::new(discover(fs.as_ref(), Path::new("/sys")));
        let mut sampler = Sampler::new(registry, fs.clone(), Some(5));
        let reader = sampler.store_reader();

        for i in 0..12 {
            fs.set_file(format!("{ZONE0}/temp"), format!("{}", i * 1000));
            sampler.tick();
        }

        assert_eq!(
            reader.snapshot(Path::new(ZONE0)).unwrap(),
            vec![7.0, 8.0, 9.0, 10.0, 11.0]
        );
        let views = reader.views(sampler.registry());
        let zone0 = views.iter().find(|v| v.descriptor.path() == Path::new(ZONE0)).unwrap();
        assert_eq!(zone0.first_index, 7);
    }
}
