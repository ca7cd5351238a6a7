//! Runtime configuration for the detector.
//!
//! This is the validated, in-memory form used by `LitterboxDetector`.
//! It is separate from the TOML-deserialized config in `litter_config`.

use crate::error::DetectorError;

/// How the cat's weight is derived from the samples seen during a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatWeightEstimator {
    /// `peak - pre_cat_baseline`.
    #[default]
    Peak,
    /// `median(presence samples) - pre_cat_baseline`; robust to a cat bracing on the rim.
    Median,
}

/// Detection parameters. Immutable for the lifetime of a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionCfg {
    /// Grams above baseline that flag possible presence.
    pub cat_weight_threshold_g: f32,
    /// Weight must stay at or above the presence threshold this long to confirm.
    pub min_presence_ms: u64,
    /// Weight must stay below threshold (and settle) this long to finalize a visit.
    pub leave_timeout_ms: u64,
    /// Max sample standard deviation (grams) for the window to count as stable.
    pub after_cat_std_dev_g: f32,
    /// History span of the stabilization window. Effective span is never below `leave_timeout_ms`.
    pub stabilization_window_ms: u64,
    /// Minimum samples before the window may report stable (>= 2).
    pub min_stable_samples: usize,
    /// Discard a confirmed presence lasting longer than this. `None` disables the guard.
    pub max_visit_ms: Option<u64>,
    pub cat_weight_estimator: CatWeightEstimator,
}

impl Default for DetectionCfg {
    fn default() -> Self {
        Self {
            cat_weight_threshold_g: 1000.0,
            min_presence_ms: 4_000,
            leave_timeout_ms: 120_000,
            after_cat_std_dev_g: 50.0,
            stabilization_window_ms: 300_000,
            min_stable_samples: 5,
            max_visit_ms: None,
            cat_weight_estimator: CatWeightEstimator::Peak,
        }
    }
}

impl DetectionCfg {
    /// Build a validated config from the four core parameters; the rest take defaults.
    pub fn new(
        cat_weight_threshold_g: f32,
        min_presence_ms: u64,
        leave_timeout_ms: u64,
        after_cat_std_dev_g: f32,
    ) -> Result<Self, DetectorError> {
        let cfg = Self {
            cat_weight_threshold_g,
            min_presence_ms,
            leave_timeout_ms,
            after_cat_std_dev_g,
            ..Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), DetectorError> {
        use DetectorError::InvalidConfiguration as Invalid;
        if !(self.cat_weight_threshold_g.is_finite() && self.cat_weight_threshold_g > 0.0) {
            return Err(Invalid("cat_weight_threshold_g must be > 0"));
        }
        if self.min_presence_ms == 0 {
            return Err(Invalid("min_presence_ms must be > 0"));
        }
        if self.leave_timeout_ms == 0 {
            return Err(Invalid("leave_timeout_ms must be > 0"));
        }
        if !(self.after_cat_std_dev_g.is_finite() && self.after_cat_std_dev_g > 0.0) {
            return Err(Invalid("after_cat_std_dev_g must be > 0"));
        }
        if self.stabilization_window_ms == 0 {
            return Err(Invalid("stabilization_window_ms must be > 0"));
        }
        if self.min_stable_samples < 2 {
            return Err(Invalid("min_stable_samples must be >= 2"));
        }
        if self.max_visit_ms == Some(0) {
            return Err(Invalid("max_visit_ms must be > 0 when set"));
        }
        Ok(())
    }

    /// Span of history the stabilization window keeps.
    #[inline]
    pub fn retention_ms(&self) -> u64 {
        self.stabilization_window_ms.max(self.leave_timeout_ms)
    }
}
