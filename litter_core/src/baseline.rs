//! Empty-box weight estimate.
//!
//! The tracker owns the stabilization window. While updates are allowed
//! (the detector passes `allow_update = state == idle`) every valid reading
//! is fed to the window and a stable window replaces the baseline with its
//! mean, which absorbs scale creep and added litter. `adopt` bypasses the
//! window for visit finalization, where stability was already proven.

use crate::config::DetectionCfg;
use crate::stabilization::StabilizationWindow;
use crate::types::Reading;

#[derive(Debug, Clone)]
pub struct BaselineTracker {
    baseline_g: f32,
    seeded: bool,
    window: StabilizationWindow,
}

impl BaselineTracker {
    pub fn new(window: StabilizationWindow) -> Self {
        Self {
            baseline_g: 0.0,
            seeded: false,
            window,
        }
    }

    pub fn from_cfg(cfg: &DetectionCfg) -> Self {
        Self::new(StabilizationWindow::from_cfg(cfg))
    }

    /// Current baseline; 0 until the first valid reading.
    #[inline]
    pub fn baseline(&self) -> f32 {
        self.baseline_g
    }

    /// Whether a valid reading has ever set the baseline.
    #[inline]
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Take the first valid reading as the starting baseline. No-op afterwards.
    pub fn seed(&mut self, grams: f32) -> bool {
        if self.seeded || !grams.is_finite() {
            return false;
        }
        self.baseline_g = grams;
        self.seeded = true;
        true
    }

    /// Feed a reading; returns true if the baseline moved.
    pub fn observe(&mut self, reading: Reading, allow_update: bool) -> bool {
        if !allow_update || reading.value().is_none() {
            return false;
        }
        self.window.push(reading);
        if !self.window.is_stable() {
            return false;
        }
        match self.window.mean() {
            Ok(mean) if mean != self.baseline_g => {
                tracing::trace!(
                    from_g = self.baseline_g,
                    to_g = mean,
                    samples = self.window.len(),
                    "baseline drift"
                );
                self.baseline_g = mean;
                self.seeded = true;
                true
            }
            _ => false,
        }
    }

    /// Force the baseline and start the window afresh.
    pub fn adopt(&mut self, grams: f32) {
        self.baseline_g = grams;
        self.seeded = true;
        self.window.reset();
    }

    pub fn window(&self) -> &StabilizationWindow {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut StabilizationWindow {
        &mut self.window
    }
}
