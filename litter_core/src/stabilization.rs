//! Time-bounded window of recent valid readings.
//!
//! Answers a single question: has the scale settled? Stable means at least
//! `min_samples` readings are held and their sample standard deviation is
//! within `max_std_dev_g`. Entries older than the retention horizon are
//! evicted on every push; absent readings never enter.

use std::collections::VecDeque;

use crate::config::DetectionCfg;
use crate::error::DetectorError;
use crate::types::Reading;
use crate::util;

#[derive(Debug, Clone)]
pub struct StabilizationWindow {
    samples: VecDeque<(u64, f32)>,
    retention_ms: u64,
    min_samples: usize,
    max_std_dev_g: f32,
}

impl StabilizationWindow {
    /// `min_samples` is raised to 2; a single sample has no spread.
    pub fn new(retention_ms: u64, min_samples: usize, max_std_dev_g: f32) -> Self {
        Self {
            samples: VecDeque::new(),
            retention_ms,
            min_samples: min_samples.max(2),
            max_std_dev_g,
        }
    }

    pub fn from_cfg(cfg: &DetectionCfg) -> Self {
        Self::new(
            cfg.retention_ms(),
            cfg.min_stable_samples,
            cfg.after_cat_std_dev_g,
        )
    }

    /// Append a valid reading and evict anything older than the horizon.
    /// Absent readings are dropped without touching the window.
    pub fn push(&mut self, reading: Reading) {
        let Some(grams) = reading.value() else {
            return;
        };
        debug_assert!(
            self.samples
                .back()
                .is_none_or(|&(last, _)| last <= reading.at_ms),
            "stabilization window fed out of order"
        );
        self.samples.push_back((reading.at_ms, grams));
        self.evict_older_than(reading.at_ms.saturating_sub(self.retention_ms));
    }

    fn evict_older_than(&mut self, cutoff_ms: u64) {
        while let Some(&(at, _)) = self.samples.front() {
            if at < cutoff_ms {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn is_stable(&self) -> bool {
        if self.samples.len() < self.min_samples {
            return false;
        }
        self.std_dev()
            .is_some_and(|sd| sd <= f64::from(self.max_std_dev_g))
    }

    /// Sample standard deviation of the held values; `None` below two samples.
    pub fn std_dev(&self) -> Option<f64> {
        util::sample_std_dev(self.samples.iter().map(|&(_, g)| g))
    }

    pub fn mean(&self) -> Result<f32, DetectorError> {
        util::mean(self.samples.iter().map(|&(_, g)| g))
            .map(|m| m as f32)
            .ok_or(DetectorError::InsufficientData)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the oldest sample still held.
    pub fn oldest_at_ms(&self) -> Option<u64> {
        self.samples.front().map(|&(at, _)| at)
    }
}
