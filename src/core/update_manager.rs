//! Update manager for driving the sampler on a fixed period

use super::Engine;
use log::{error, info, trace, warn};
use sens_capture_core::{SensorRegistry, StoreReader};
use sens_capture_sources::Sampler;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

/// Runs `Sampler::tick` once per sampling period
pub struct UpdateManager {
    sampler: Arc<Mutex<Sampler>>,
    registry: Arc<SensorRegistry>,
    store: StoreReader,
    period: Duration,
    max_ticks: Option<u64>,
}

impl UpdateManager {
    /// Create an update manager that takes over the engine's sampler
    pub fn new(engine: Engine) -> Self {
        let registry = Arc::clone(engine.registry());
        let store = engine.store_reader();
        let period = engine.sampling_period();
        Self {
            sampler: Arc::new(Mutex::new(engine.into_sampler())),
            registry,
            store,
            period,
            max_ticks: None,
        }
    }

    /// Stop on its own after `max_ticks` ticks
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn registry(&self) -> &Arc<SensorRegistry> {
        &self.registry
    }

    pub fn store_reader(&self) -> StoreReader {
        self.store.clone()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the sampling loop
    ///
    /// Runs until `shutdown` becomes `true` (or its sender is dropped), or
    /// until the tick limit is reached. Ticks that would start late because
    /// the previous one overran are skipped rather than bunched up. Returns
    /// the number of completed ticks; a tick whose task panicked does not
    /// count, either here or toward the limit.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        if *shutdown.borrow() {
            return 0;
        }

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut completed = 0;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Sampling stopped after {} ticks", completed);
                        break;
                    }
                    continue;
                }
            }

            let start = Instant::now();
            let sampler = Arc::clone(&self.sampler);
            // Sensor reads are blocking file I/O
            let result = tokio::task::spawn_blocking(move || lock_sampler(&sampler).tick()).await;
            match result {
                Ok(summary) => {
                    trace!(
                        "Tick {}: {} sampled, {} failed",
                        summary.tick,
                        summary.sampled,
                        summary.failed
                    );
                    completed += 1;
                }
                Err(e) => error!("Sampling task failed: {}", e),
            }

            let elapsed = start.elapsed();
            if elapsed > self.period {
                warn!(
                    "Sampling tick took {:?}, longer than the {:?} period",
                    elapsed, self.period
                );
            } else {
                trace!("Sampling tick took {:?}", elapsed);
            }

            if self.max_ticks.is_some_and(|max| completed >= max) {
                info!("Reached tick limit of {}", completed);
                break;
            }
        }

        completed
    }
}

fn lock_sampler(sampler: &Mutex<Sampler>) -> std::sync::MutexGuard<'_, Sampler> {
    // Use unwrap_or_else to recover from poisoned mutex - the series are still valid
    sampler.lock().unwrap_or_else(|poisoned| {
        warn!("Sampler mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sens_capture_core::{MemorySysfs, SamplerConfig, SensorDescriptor, SensorError};
    use sens_capture_sources::ErrorSink;
    use std::path::Path;

    /// Panics on the first failure of a streak, taking the tick down with it
    struct PanickingSink;

    impl ErrorSink for PanickingSink {
        fn report(&self, descriptor: &SensorDescriptor, _error: &SensorError, consecutive_failures: u32) {
            if consecutive_failures == 1 {
                panic!("sink rejected failure of {}", descriptor.caption());
            }
        }
    }

    fn memory_sysfs() -> Arc<MemorySysfs> {
        Arc::new(
            MemorySysfs::new()
                .with_file("/sys/class/thermal/thermal_zone0/type", "cpu-thermal")
                .with_file("/sys/class/thermal/thermal_zone0/temp", "40000")
                .with_file("/sys/class/regulator/regulator.0/name", "vdd")
                .with_file("/sys/class/regulator/regulator.0/type", "voltage")
                .with_file("/sys/class/regulator/regulator.0/microvolts", "900000"),
        )
    }

    fn engine_on(fs: Arc<MemorySysfs>, period_ms: u64) -> Engine {
        let config = SamplerConfig {
            sampling_period_ms: period_ms,
            read_timeout_ms: None,
            ..Default::default()
        };
        Engine::with_reader(fs, &config)
    }

    fn engine(period_ms: u64) -> Engine {
        engine_on(memory_sysfs(), period_ms)
    }

    #[tokio::test]
    async fn test_runs_until_tick_limit() {
        let manager = UpdateManager::new(engine(1)).with_max_ticks(Some(5));
        let (_tx, rx) = watch::channel(false);

        let ticks = manager.run(rx).await;
        assert_eq!(ticks, 5);

        let store = manager.store_reader();
        for descriptor in manager.registry().iter() {
            assert_eq!(store.len(descriptor.path()), Some(5));
        }
        assert_eq!(
            store.last(Path::new("/sys/class/regulator/regulator.0")),
            Some(900.0)
        );
    }

    #[tokio::test]
    async fn test_stops_on_shutdown_signal() {
        let manager = Arc::new(UpdateManager::new(engine(5)));
        let (tx, rx) = watch::channel(false);

        let runner = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.run(rx).await })
        };

        tokio::time::sleep(Duration::from_millis(60)).await;
        tx.send(true).unwrap();
        let ticks = runner.await.unwrap();

        assert!(ticks >= 1);
        let len = manager
            .store_reader()
            .len(Path::new("/sys/class/thermal/thermal_zone0"))
            .unwrap();
        assert_eq!(len as u64, ticks);
    }

    #[tokio::test]
    async fn test_panicked_tick_does_not_count() {
        let fs = memory_sysfs();
        let engine = engine_on(fs.clone(), 1).with_error_sink(PanickingSink);
        fs.remove(Path::new("/sys/class/regulator/regulator.0/microvolts"));

        // The first tick panics in the sink before committing anything
        let manager = UpdateManager::new(engine).with_max_ticks(Some(3));
        let (_tx, rx) = watch::channel(false);
        assert_eq!(manager.run(rx).await, 3);

        let store = manager.store_reader();
        assert_eq!(store.len(Path::new("/sys/class/thermal/thermal_zone0")), Some(3));
        assert_eq!(store.len(Path::new("/sys/class/regulator/regulator.0")), Some(0));
    }

    #[tokio::test]
    async fn test_already_shut_down() {
        let manager = UpdateManager::new(engine(1));
        let (_tx, rx) = watch::channel(true);
        assert_eq!(manager.run(rx).await, 0);
    }
}
