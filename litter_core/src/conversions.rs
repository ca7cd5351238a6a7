//! `From` implementations bridging `litter_config` types to `litter_core` types.

use crate::config::{CatWeightEstimator, DetectionCfg};
use crate::types::Reading;

// ── CatWeightEstimator ───────────────────────────────────────────────────────

impl From<litter_config::CatWeightEstimator> for CatWeightEstimator {
    fn from(e: litter_config::CatWeightEstimator) -> Self {
        match e {
            litter_config::CatWeightEstimator::Peak => Self::Peak,
            litter_config::CatWeightEstimator::Median => Self::Median,
        }
    }
}

// ── DetectionCfg ─────────────────────────────────────────────────────────────

impl From<&litter_config::DetectionCfg> for DetectionCfg {
    fn from(c: &litter_config::DetectionCfg) -> Self {
        Self {
            cat_weight_threshold_g: c.cat_weight_threshold_g,
            min_presence_ms: c.min_presence_ms,
            leave_timeout_ms: c.leave_timeout_ms,
            after_cat_std_dev_g: c.after_cat_std_dev_g,
            stabilization_window_ms: c.stabilization_window_ms,
            min_stable_samples: c.min_stable_samples,
            max_visit_ms: c.max_visit_ms,
            cat_weight_estimator: c.cat_weight_estimator.into(),
        }
    }
}

// ── Reading ──────────────────────────────────────────────────────────────────

impl From<&litter_config::ReadingRow> for Reading {
    fn from(r: &litter_config::ReadingRow) -> Self {
        Self {
            at_ms: r.at_ms,
            grams: r.grams,
        }
    }
}
