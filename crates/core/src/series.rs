//! Per-sensor time series and the store that holds them
//!
//! The store has a single writer ([`StoreWriter`], owned by the sampler) and
//! any number of read-only handles ([`StoreReader`]) for renderers. Both sit
//! on one `RwLock`; snapshots are copies taken under the read lock, and the
//! sampler commits a whole tick under one write lock, so a reader never sees
//! a tick half applied.

use crate::SensorRegistry;
use sens_capture_types::{Sample, SensorDescriptor};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Append-only sequence of samples for one sensor.
///
/// Unbounded by default. With a capacity it behaves as a ring buffer,
/// dropping the oldest sample once full.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    samples: VecDeque<Sample>,
    capacity: Option<usize>,
    total_appended: u64,
}

impl TimeSeries {
    /// Series that keeps every sample
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Series that keeps at most `capacity` samples (at least one)
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
            total_appended: 0,
        }
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(capacity) => Self::bounded(capacity),
            None => Self::unbounded(),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        if let Some(capacity) = self.capacity {
            while self.samples.len() >= capacity {
                self.samples.pop_front();
            }
        }
        self.samples.push_back(sample);
        self.total_appended += 1;
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Samples ever appended, including evicted ones
    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }

    /// Position of the oldest retained sample among all samples ever appended
    pub fn first_index(&self) -> u64 {
        self.total_appended - self.samples.len() as u64
    }

    pub fn last(&self) -> Option<Sample> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Sample> {
        self.iter().collect()
    }
}

/// One series per registered sensor, keyed by sensor path
#[derive(Debug, Clone, Default)]
pub struct Store {
    series: HashMap<PathBuf, TimeSeries>,
}

impl Store {
    /// Empty series for every sensor in the registry
    pub fn new(registry: &SensorRegistry, capacity: Option<usize>) -> Self {
        let series = registry
            .iter()
            .map(|d| (d.path().to_path_buf(), TimeSeries::with_capacity(capacity)))
            .collect();
        Self { series }
    }

    /// Append a sample. Returns `false` for a path that was not registered;
    /// the key set never changes after construction.
    pub fn append(&mut self, path: &Path, sample: Sample) -> bool {
        match self.series.get_mut(path) {
            Some(series) => {
                series.push(sample);
                true
            }
            None => false,
        }
    }

    /// Copy of a sensor's samples, oldest first
    pub fn snapshot(&self, path: &Path) -> Option<Vec<Sample>> {
        self.series.get(path).map(TimeSeries::to_vec)
    }

    pub fn series(&self, path: &Path) -> Option<&TimeSeries> {
        self.series.get(path)
    }

    /// Number of sensors in the store
    pub fn sensor_count(&self) -> usize {
        self.series.len()
    }

    /// Turn the store into a writer/reader pair
    pub fn into_shared(self) -> (StoreWriter, StoreReader) {
        let inner = Arc::new(RwLock::new(self));
        (
            StoreWriter {
                inner: Arc::clone(&inner),
            },
            StoreReader { inner },
        )
    }
}

/// Exclusive write access to a shared store
#[derive(Debug)]
pub struct StoreWriter {
    inner: Arc<RwLock<Store>>,
}

impl StoreWriter {
    pub fn append(&self, path: &Path, sample: Sample) -> bool {
        self.write().append(path, sample)
    }

    /// Append a batch under a single write lock.
    ///
    /// Returns how many samples were stored.
    pub fn append_batch<'a, I>(&self, batch: I) -> usize
    where
        I: IntoIterator<Item = (&'a Path, Sample)>,
    {
        let mut store = self.write();
        let mut stored = 0;
        for (path, sample) in batch {
            if store.append(path, sample) {
                stored += 1;
            }
        }
        stored
    }

    /// A new read handle on the same store
    pub fn reader(&self) -> StoreReader {
        StoreReader {
            inner: Arc::clone(&self.inner),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.inner.write().unwrap_or_else(|poisoned| {
            log::warn!("Store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Cloneable read-only handle on a shared store
#[derive(Debug, Clone)]
pub struct StoreReader {
    inner: Arc<RwLock<Store>>,
}

impl StoreReader {
    /// Copy of a sensor's samples, oldest first
    pub fn snapshot(&self, path: &Path) -> Option<Vec<Sample>> {
        self.read().snapshot(path)
    }

    /// Retained sample count for a sensor
    pub fn len(&self, path: &Path) -> Option<usize> {
        self.read().series(path).map(TimeSeries::len)
    }

    /// Most recent sample for a sensor
    pub fn last(&self, path: &Path) -> Option<Sample> {
        self.read().series(path).and_then(TimeSeries::last)
    }

    /// Snapshot of every registered series paired with its descriptor,
    /// ordered by sensor path, all taken under one lock
    pub fn views(&self, registry: &SensorRegistry) -> Vec<SeriesView> {
        let store = self.read();
        registry
            .iter()
            .filter_map(|descriptor| {
                let series = store.series(descriptor.path())?;
                Some(SeriesView {
                    descriptor: descriptor.clone(),
                    first_index: series.first_index(),
                    samples: series.to_vec(),
                })
            })
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.inner.read().unwrap_or_else(|poisoned| {
            log::warn!("Store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// A sensor's series as handed to a renderer
#[derive(Debug, Clone, Serialize)]
pub struct SeriesView {
    pub descriptor: SensorDescriptor,
    /// Index of `samples[0]` among all samples ever taken for this sensor
    pub first_index: u64,
    pub samples: Vec<Sample>,
}

impl SeriesView {
    pub fn last(&self) -> Option<Sample> {
        self.samples.last().copied()
    }

    /// Smallest and largest retained sample
    pub fn range(&self) -> Option<(Sample, Sample)> {
        let mut iter = self.samples.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s))))
    }
}
