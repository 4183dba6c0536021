//! Bounded rolling history with live statistics.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::warn;

use lumenwatch_types::{Domain, Sample, Statistics, WindowExport};

use crate::AggregatorError;

/// An independent copy of the window and the statistics derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    /// Oldest first.
    pub samples: Vec<Sample>,
    pub statistics: Statistics,
    /// Samples seen outside the domain since creation.
    pub out_of_range: u64,
}

impl WindowSnapshot {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fixed-capacity FIFO window of samples.
///
/// Pushing beyond capacity evicts the oldest sample. Eviction and insertion
/// happen under one write lock, and [`snapshot`](Self::snapshot) copies under
/// the read lock, so a reader sees either the window before a push or after
/// it, never in between.
#[derive(Debug)]
pub struct RollingAggregator {
    capacity: usize,
    domain: Domain,
    window: RwLock<VecDeque<Sample>>,
    out_of_range: AtomicU64,
}

impl RollingAggregator {
    /// Create an empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self, AggregatorError> {
        if capacity == 0 {
            return Err(AggregatorError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            domain: Domain::default(),
            window: RwLock::new(VecDeque::with_capacity(capacity)),
            out_of_range: AtomicU64::new(0),
        })
    }

    /// Set the domain used to flag out-of-range samples.
    pub fn with_domain(mut self, domain: Domain) -> Result<Self, AggregatorError> {
        if !(domain.min.is_finite() && domain.max.is_finite() && domain.min < domain.max) {
            return Err(AggregatorError::InvalidDomain {
                min: domain.min,
                max: domain.max,
            });
        }
        self.domain = domain;
        Ok(self)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Append a sample, evicting the oldest if the window is full.
    ///
    /// Out-of-domain samples are kept and counted.
    pub fn push(&self, sample: Sample) {
        let value = sample.value.get();
        if !self.domain.contains(value) {
            self.out_of_range.fetch_add(1, Ordering::Relaxed);
            warn!(
                value,
                min = self.domain.min,
                max = self.domain.max,
                "sample outside expected domain"
            );
        }

        let mut window = self.window.write();
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(sample);
    }

    /// Copy the window and compute its statistics.
    pub fn snapshot(&self) -> WindowSnapshot {
        let samples: Vec<Sample> = self.window.read().iter().copied().collect();
        let statistics = Statistics::from_samples(&samples);
        WindowSnapshot {
            samples,
            statistics,
            out_of_range: self.out_of_range.load(Ordering::Relaxed),
        }
    }

    /// Statistics over the current window.
    pub fn statistics(&self) -> Statistics {
        Statistics::from_samples(self.window.read().iter())
    }

    /// Build the dashboard export for this window.
    pub fn export(&self, channel: &str, threshold: f64) -> WindowExport {
        let snapshot = self.snapshot();
        WindowExport::build(
            channel,
            &snapshot.samples,
            snapshot.statistics,
            threshold,
            self.domain,
            snapshot.out_of_range,
        )
    }

    pub fn len(&self) -> usize {
        self.window.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.read().is_empty()
    }

    /// Drop every sample. The out-of-range counter is kept.
    pub fn clear(&self) {
        self.window.write().clear();
    }

    pub fn out_of_range(&self) -> u64 {
        self.out_of_range.load(Ordering::Relaxed)
    }
}
