//! Per-visit accumulation.
//!
//! A visit opens when weight first crosses the presence threshold (`begin`,
//! which pins the pre-cat baseline and starts the presence samples), is confirmed after the debounce
//! (`confirm`, which starts the peak), and survives any number of
//! `cat_present` / `after_cat` bounces until `finalize` or `abandon`.
//! The peak never decreases while a visit is open.

use std::collections::VecDeque;

use crate::config::CatWeightEstimator;
use crate::error::DetectorError;
use crate::types::VisitResult;
use crate::util;

/// Cap on retained presence samples: one hour at 10 Hz.
pub const MAX_PRESENCE_SAMPLES: usize = 36_000;

#[derive(Debug, Clone, Default)]
pub struct VisitAccumulator {
    estimator: CatWeightEstimator,
    pre_cat_baseline_g: Option<f32>,
    peak_g: Option<f32>,
    confirmed_at_ms: Option<u64>,
    // Only filled for the median estimator
    presence: VecDeque<f32>,
}

impl VisitAccumulator {
    pub fn new(estimator: CatWeightEstimator) -> Self {
        Self {
            estimator,
            ..Self::default()
        }
    }

    /// Open a visit at the first reading over the threshold, remembering the
    /// baseline the results are measured against.
    pub fn begin(&mut self, baseline_g: f32, grams: f32) {
        self.clear();
        self.pre_cat_baseline_g = Some(baseline_g);
        self.record(grams);
    }

    /// A reading over the threshold while presence is still unconfirmed.
    /// Feeds the median only; the peak starts at `confirm`.
    pub fn hold(&mut self, grams: f32) {
        self.record(grams);
    }

    /// Presence confirmed: the confirming reading is the first peak.
    pub fn confirm(&mut self, at_ms: u64, grams: f32) {
        self.confirmed_at_ms = Some(at_ms);
        self.peak_g = Some(grams);
        self.record(grams);
    }

    /// Another reading above threshold during a confirmed visit.
    pub fn observe(&mut self, grams: f32) {
        self.peak_g = Some(self.peak_g.map_or(grams, |p| p.max(grams)));
        self.record(grams);
    }

    fn record(&mut self, grams: f32) {
        if self.estimator != CatWeightEstimator::Median {
            return;
        }
        if self.presence.len() == MAX_PRESENCE_SAMPLES {
            self.presence.pop_front();
        }
        self.presence.push_back(grams);
    }

    /// Drop the visit without producing results.
    pub fn abandon(&mut self) {
        self.clear();
    }

    /// Compute results against `new_baseline_g` and close the visit.
    ///
    /// Fails without mutating anything if no confirmed visit is open.
    pub fn finalize(&mut self, new_baseline_g: f32) -> Result<VisitResult, DetectorError> {
        let Some(pre) = self.pre_cat_baseline_g else {
            return Err(DetectorError::State("finalize without a pre-cat baseline"));
        };
        let Some(cat_level) = self.cat_level() else {
            return Err(DetectorError::State("finalize before presence was confirmed"));
        };
        let result = VisitResult {
            cat_weight_g: cat_level - pre,
            waste_weight_g: new_baseline_g - pre,
        };
        self.clear();
        Ok(result)
    }

    fn cat_level(&self) -> Option<f32> {
        match self.estimator {
            CatWeightEstimator::Peak => self.peak_g,
            CatWeightEstimator::Median => {
                let mut scratch: Vec<f32> = self.presence.iter().copied().collect();
                util::median_in_place(&mut scratch).or(self.peak_g)
            }
        }
    }

    fn clear(&mut self) {
        self.pre_cat_baseline_g = None;
        self.peak_g = None;
        self.confirmed_at_ms = None;
        self.presence.clear();
    }

    pub fn pre_cat_baseline(&self) -> Option<f32> {
        self.pre_cat_baseline_g
    }

    pub fn peak(&self) -> Option<f32> {
        self.peak_g
    }

    pub fn confirmed_at_ms(&self) -> Option<u64> {
        self.confirmed_at_ms
    }

    /// A visit has been opened (and not yet finalized or abandoned).
    pub fn is_open(&self) -> bool {
        self.pre_cat_baseline_g.is_some()
    }

    pub fn estimator(&self) -> CatWeightEstimator {
        self.estimator
    }
}
