//! The presence state machine (`LitterboxDetector`).
//!
//! Consumes one reading at a time and moves between `idle`,
//! `waiting_for_confirmation`, `cat_present` and `after_cat`:
//!
//! | from | reading vs. `P = baseline + threshold` | to |
//! |---|---|---|
//! | idle | `< P` (baseline may drift) | idle |
//! | idle | `>= P` | waiting_for_confirmation |
//! | waiting | `< P` (visit abandoned) | idle |
//! | waiting | `>= P`, held for `min_presence_ms` | cat_present |
//! | cat_present | `>= P` (peak tracked) | cat_present |
//! | cat_present | `< P` | after_cat |
//! | after_cat | `>= P` (same visit) | cat_present |
//! | after_cat | `< P`, stable and `leave_timeout_ms` elapsed | idle (visit finalized) |
//!
//! Absent readings are ignored outright. Readings older than the last
//! processed one are rejected with `OutOfOrderReading` and change nothing.

use crate::baseline::BaselineTracker;
use crate::config::DetectionCfg;
use crate::error::DetectorError;
use crate::sink::{NullSink, ResultSink};
use crate::state::DetectionState;
use crate::types::{Reading, Snapshot};
use crate::util::ms_to_secs;
use crate::visit::VisitAccumulator;

pub struct LitterboxDetector<K: ResultSink = NullSink> {
    cfg: DetectionCfg,
    sink: K,
    state: DetectionState,
    tracker: BaselineTracker,
    visit: VisitAccumulator,
    state_entered_at_ms: u64,
    last_at_ms: Option<u64>,
    cat_weight_g: Option<f32>,
    waste_weight_g: Option<f32>,
    last_emitted: Option<Snapshot>,
    visits_finalized: u64,
}

impl<K: ResultSink> core::fmt::Debug for LitterboxDetector<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LitterboxDetector")
            .field("state", &self.state)
            .field("baseline_g", &self.tracker.baseline())
            .field("pre_cat_baseline_g", &self.visit.pre_cat_baseline())
            .field("peak_g", &self.visit.peak())
            .field("confirmed_at_ms", &self.visit.confirmed_at_ms())
            .field("state_entered_at_ms", &self.state_entered_at_ms)
            .field("last_at_ms", &self.last_at_ms)
            .field("window_len", &self.tracker.window().len())
            .field("cat_weight_g", &self.cat_weight_g)
            .field("waste_weight_g", &self.waste_weight_g)
            .finish()
    }
}

impl LitterboxDetector<NullSink> {
    /// Start building a detector.
    pub fn builder() -> DetectorBuilder<NullSink> {
        DetectorBuilder::default()
    }

    /// Detector with no sink; results are read back through `snapshot()`.
    pub fn new(cfg: DetectionCfg) -> Result<Self, DetectorError> {
        Self::builder().with_config(cfg).build()
    }
}

impl<K: ResultSink> LitterboxDetector<K> {
    /// Process one reading. Returns the state after the reading.
    pub fn on_reading(&mut self, reading: Reading) -> Result<DetectionState, DetectorError> {
        if let Some(last_ms) = self.last_at_ms.filter(|&last| reading.at_ms < last) {
            tracing::warn!(at_ms = reading.at_ms, last_ms, "out-of-order reading rejected");
            return Err(DetectorError::OutOfOrderReading {
                at_ms: reading.at_ms,
                last_ms,
            });
        }
        let Some(grams) = reading.value() else {
            tracing::trace!(at_ms = reading.at_ms, "absent reading ignored");
            return Ok(self.state);
        };
        self.last_at_ms = Some(reading.at_ms);

        if self.tracker.seed(grams) {
            tracing::debug!(baseline_g = grams, "initial baseline from first reading");
        }

        let now_ms = reading.at_ms;
        let above = grams >= self.presence_threshold();

        match self.state {
            DetectionState::Idle => {
                if above {
                    self.visit.begin(self.tracker.baseline(), grams);
                    self.tracker.window_mut().reset();
                    self.enter(DetectionState::WaitingForConfirmation, now_ms, grams);
                } else {
                    self.tracker.observe(reading, true);
                }
            }
            DetectionState::WaitingForConfirmation => {
                if !above {
                    self.visit.abandon();
                    self.enter(DetectionState::Idle, now_ms, grams);
                } else if self.elapsed_ms(now_ms) >= self.cfg.min_presence_ms {
                    self.visit.confirm(now_ms, grams);
                    self.enter(DetectionState::CatPresent, now_ms, grams);
                } else {
                    self.visit.hold(grams);
                }
            }
            DetectionState::CatPresent => {
                if !above {
                    self.tracker.window_mut().reset();
                    self.enter(DetectionState::AfterCat, now_ms, grams);
                } else if self.overstayed(now_ms) {
                    self.discard_visit(now_ms, grams);
                } else {
                    self.visit.observe(grams);
                }
            }
            DetectionState::AfterCat => {
                if above {
                    self.visit.observe(grams);
                    self.enter(DetectionState::CatPresent, now_ms, grams);
                } else {
                    self.tracker.window_mut().push(reading);
                    if self.tracker.window().is_stable()
                        && self.elapsed_ms(now_ms) >= self.cfg.leave_timeout_ms
                    {
                        self.finalize_visit(now_ms)?;
                    }
                }
            }
        }

        self.emit_if_changed();
        Ok(self.state)
    }

    fn finalize_visit(&mut self, now_ms: u64) -> Result<(), DetectorError> {
        let new_baseline = self.tracker.window().mean()?;
        let result = self.visit.finalize(new_baseline)?;
        self.tracker.adopt(new_baseline);
        self.cat_weight_g = Some(result.cat_weight_g);
        self.waste_weight_g = Some(result.waste_weight_g);
        self.visits_finalized = self.visits_finalized.saturating_add(1);

        if result.cat_weight_g < 0.0 {
            tracing::warn!(
                cat_weight_g = result.cat_weight_g,
                "negative cat weight; possible sensor drift"
            );
        }
        tracing::info!(
            cat_weight_g = result.cat_weight_g,
            waste_weight_g = result.waste_weight_g,
            baseline_g = new_baseline,
            "visit finalized"
        );
        self.enter(DetectionState::Idle, now_ms, new_baseline);
        Ok(())
    }

    fn overstayed(&self, now_ms: u64) -> bool {
        match (self.cfg.max_visit_ms, self.visit.confirmed_at_ms()) {
            (Some(max_ms), Some(confirmed)) => now_ms.saturating_sub(confirmed) > max_ms,
            _ => false,
        }
    }

    /// Presence lasted too long to be a cat (litter refill, box moved):
    /// forget the visit and take the current weight as the new empty box.
    fn discard_visit(&mut self, now_ms: u64, grams: f32) {
        tracing::warn!(
            lasted_s = self
                .visit
                .confirmed_at_ms()
                .map(|c| ms_to_secs(now_ms.saturating_sub(c))),
            baseline_g = grams,
            "presence exceeded max visit time; discarding"
        );
        self.visit.abandon();
        self.tracker.adopt(grams);
        self.enter(DetectionState::Idle, now_ms, grams);
    }

    fn enter(&mut self, next: DetectionState, at_ms: u64, grams: f32) {
        tracing::debug!(
            from = %self.state,
            to = %next,
            at_ms,
            grams,
            baseline_g = self.tracker.baseline(),
            "state transition"
        );
        self.state = next;
        self.state_entered_at_ms = at_ms;
    }

    #[inline]
    fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.state_entered_at_ms)
    }

    fn emit_if_changed(&mut self) {
        let snap = self.snapshot();
        if self.last_emitted != Some(snap) {
            self.sink.on_state_change(&snap);
            self.last_emitted = Some(snap);
        }
    }

    /// `baseline + cat_weight_threshold`.
    #[inline]
    pub fn presence_threshold(&self) -> f32 {
        self.tracker.baseline() + self.cfg.cat_weight_threshold_g
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            baseline_g: self.tracker.baseline(),
            cat_weight_g: self.cat_weight_g,
            waste_weight_g: self.waste_weight_g,
        }
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    pub fn baseline(&self) -> f32 {
        self.tracker.baseline()
    }

    pub fn pre_cat_baseline(&self) -> Option<f32> {
        self.visit.pre_cat_baseline()
    }

    pub fn peak_weight(&self) -> Option<f32> {
        self.visit.peak()
    }

    pub fn cat_weight(&self) -> Option<f32> {
        self.cat_weight_g
    }

    pub fn waste_weight(&self) -> Option<f32> {
        self.waste_weight_g
    }

    pub fn state_entered_at_ms(&self) -> u64 {
        self.state_entered_at_ms
    }

    pub fn last_reading_at_ms(&self) -> Option<u64> {
        self.last_at_ms
    }

    /// Number of visits finalized since construction.
    pub fn visits_finalized(&self) -> u64 {
        self.visits_finalized
    }

    pub fn config(&self) -> &DetectionCfg {
        &self.cfg
    }

    pub fn tracker(&self) -> &BaselineTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }
}

/// Builder for `LitterboxDetector`. The config is validated on `build()`.
pub struct DetectorBuilder<K> {
    cfg: Option<DetectionCfg>,
    sink: K,
    restored_cat_weight_g: Option<f32>,
    restored_waste_weight_g: Option<f32>,
}

impl Default for DetectorBuilder<NullSink> {
    fn default() -> Self {
        Self {
            cfg: None,
            sink: NullSink,
            restored_cat_weight_g: None,
            restored_waste_weight_g: None,
        }
    }
}

impl<K: ResultSink> DetectorBuilder<K> {
    pub fn with_config(mut self, cfg: DetectionCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }

    pub fn with_sink<K2: ResultSink>(self, sink: K2) -> DetectorBuilder<K2> {
        DetectorBuilder {
            cfg: self.cfg,
            sink,
            restored_cat_weight_g: self.restored_cat_weight_g,
            restored_waste_weight_g: self.restored_waste_weight_g,
        }
    }

    /// Seed the last-known results (e.g. persisted by the host before a restart).
    /// Non-finite values are ignored.
    pub fn with_restored(mut self, cat_weight_g: Option<f32>, waste_weight_g: Option<f32>) -> Self {
        self.restored_cat_weight_g = cat_weight_g.filter(|g| g.is_finite());
        self.restored_waste_weight_g = waste_weight_g.filter(|g| g.is_finite());
        self
    }

    pub fn build(self) -> Result<LitterboxDetector<K>, DetectorError> {
        let cfg = self.cfg.unwrap_or_default();
        cfg.validate()?;
        Ok(LitterboxDetector {
            tracker: BaselineTracker::from_cfg(&cfg),
            visit: VisitAccumulator::new(cfg.cat_weight_estimator),
            cfg,
            sink: self.sink,
            state: DetectionState::Idle,
            state_entered_at_ms: 0,
            last_at_ms: None,
            cat_weight_g: self.restored_cat_weight_g,
            waste_weight_g: self.restored_waste_weight_g,
            last_emitted: None,
            visits_finalized: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> DetectionCfg {
        DetectionCfg {
            cat_weight_threshold_g: 900.0,
            min_presence_ms: 3_000,
            leave_timeout_ms: 45_000,
            after_cat_std_dev_g: 10.0,
            ..DetectionCfg::default()
        }
    }

    #[test]
    fn builder_defaults_are_valid() {
        let d = LitterboxDetector::builder().build().unwrap();
        assert_eq!(d.state(), DetectionState::Idle);
        assert_eq!(d.baseline(), 0.0);
        assert_eq!(d.config(), &DetectionCfg::default());
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let bad = DetectionCfg {
            leave_timeout_ms: 0,
            ..cfg()
        };
        let err = LitterboxDetector::new(bad).unwrap_err();
        assert!(matches!(err, DetectorError::InvalidConfiguration(_)));
    }

    #[test]
    fn restored_values_show_in_first_snapshot() {
        let d = LitterboxDetector::builder()
            .with_config(cfg())
            .with_restored(Some(4_300.0), Some(f32::NAN))
            .build()
            .unwrap();
        let s = d.snapshot();
        assert_eq!(s.cat_weight_g, Some(4_300.0));
        assert_eq!(s.waste_weight_g, None);
    }

    #[test]
    fn first_valid_reading_seeds_baseline() {
        let mut d = LitterboxDetector::new(cfg()).unwrap();
        d.on_reading(Reading::absent(0)).unwrap();
        assert_eq!(d.baseline(), 0.0);
        d.on_reading(Reading::new(1_000, 5_000.0)).unwrap();
        assert_eq!(d.baseline(), 5_000.0);
        assert_eq!(d.state(), DetectionState::Idle);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let mut d = LitterboxDetector::new(cfg()).unwrap();
        d.on_reading(Reading::new(0, 100.0)).unwrap();
        d.on_reading(Reading::new(1_000, 999.9)).unwrap();
        assert_eq!(d.state(), DetectionState::Idle);
        d.on_reading(Reading::new(2_000, 1_000.0)).unwrap();
        assert_eq!(d.state(), DetectionState::WaitingForConfirmation);
        assert_eq!(d.pre_cat_baseline(), Some(100.0));
    }

    #[test]
    fn equal_timestamps_are_accepted() {
        let mut d = LitterboxDetector::new(cfg()).unwrap();
        d.on_reading(Reading::new(5_000, 10.0)).unwrap();
        d.on_reading(Reading::new(5_000, 11.0)).unwrap();
        assert_eq!(d.last_reading_at_ms(), Some(5_000));
    }

    #[test]
    fn debug_lists_session_fields() {
        let d = LitterboxDetector::new(cfg()).unwrap();
        let s = format!("{d:?}");
        assert!(s.contains("pre_cat_baseline_g"));
        assert!(s.contains("peak_g"));
        assert!(s.contains("state_entered_at_ms"));
    }
}
