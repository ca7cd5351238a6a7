#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use litter_core::{DetectionCfg, DetectionState, DetectorError, LitterboxDetector, Reading};

#[derive(Debug, Arbitrary)]
struct Step {
    dt_ms: u16,
    grams: Option<f32>,
    backwards: bool,
}

fuzz_target!(|steps: Vec<Step>| {
    let cfg = DetectionCfg {
        cat_weight_threshold_g: 900.0,
        min_presence_ms: 1_000,
        leave_timeout_ms: 5_000,
        after_cat_std_dev_g: 10.0,
        stabilization_window_ms: 5_000,
        ..DetectionCfg::default()
    };
    let Ok(mut d) = LitterboxDetector::new(cfg) else {
        return;
    };
    let mut now: u64 = 0;
    for s in steps {
        let at_ms = if s.backwards {
            now.saturating_sub(u64::from(s.dt_ms))
        } else {
            now += u64::from(s.dt_ms);
            now
        };
        let before = d.state();
        match d.on_reading(Reading { at_ms, grams: s.grams }) {
            Ok(_) => {}
            Err(DetectorError::OutOfOrderReading { .. }) => assert_eq!(d.state(), before),
            Err(e) => panic!("unexpected detector error: {e}"),
        }
        // The peak only exists while a visit is confirmed
        if d.state() == DetectionState::Idle {
            assert!(d.peak_weight().is_none());
        }
    }
});
