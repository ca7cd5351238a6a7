//! End-to-end detector scenarios driven with logical timestamps (1 Hz).

use litter_core::{
    CatWeightEstimator, DetectionCfg, DetectionState, DetectorError, LitterboxDetector, Reading,
    RecordingSink,
};
use rstest::rstest;

const S: u64 = 1_000;

fn scenario_a_cfg() -> DetectionCfg {
    DetectionCfg {
        cat_weight_threshold_g: 900.0,
        min_presence_ms: 3 * S,
        leave_timeout_ms: 45 * S,
        after_cat_std_dev_g: 10.0,
        ..DetectionCfg::default()
    }
}

fn recording(cfg: DetectionCfg) -> LitterboxDetector<RecordingSink> {
    LitterboxDetector::builder()
        .with_config(cfg)
        .with_sink(RecordingSink::default())
        .build()
        .expect("valid config")
}

fn feed<K: litter_core::ResultSink>(
    d: &mut LitterboxDetector<K>,
    secs: impl IntoIterator<Item = u64>,
    grams: f32,
) -> DetectionState {
    let mut last = d.state();
    for t in secs {
        last = d.on_reading(Reading::new(t * S, grams)).expect("in order");
    }
    last
}

#[test]
fn scenario_a_single_visit() {
    let mut d = recording(scenario_a_cfg());

    assert_eq!(feed(&mut d, [0], 0.0), DetectionState::Idle);
    assert_eq!(feed(&mut d, 1..=3, 4_200.0), DetectionState::WaitingForConfirmation);
    assert_eq!(feed(&mut d, [4], 4_200.0), DetectionState::CatPresent);
    assert_eq!(d.pre_cat_baseline(), Some(0.0));

    assert_eq!(feed(&mut d, [5], 4_500.0), DetectionState::CatPresent);
    assert_eq!(d.peak_weight(), Some(4_500.0));

    assert_eq!(feed(&mut d, [6], 50.0), DetectionState::AfterCat);
    assert_eq!(feed(&mut d, 7..=50, 60.0), DetectionState::AfterCat);
    assert_eq!(d.cat_weight(), None);

    assert_eq!(feed(&mut d, [51], 60.0), DetectionState::Idle);
    assert_eq!(d.cat_weight(), Some(4_500.0));
    assert_eq!(d.waste_weight(), Some(60.0));
    assert_eq!(d.baseline(), 60.0);
    assert_eq!(d.pre_cat_baseline(), None);
    assert_eq!(d.peak_weight(), None);
    assert_eq!(d.visits_finalized(), 1);

    let states: Vec<_> = d.sink().snapshots().iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        [
            DetectionState::Idle,
            DetectionState::WaitingForConfirmation,
            DetectionState::CatPresent,
            DetectionState::AfterCat,
            DetectionState::Idle,
        ]
    );
    let last = d.sink().last().expect("emitted");
    assert_eq!(last.cat_weight_g, Some(4_500.0));
    assert_eq!(last.waste_weight_g, Some(60.0));
    assert_eq!(last.baseline_g, 60.0);
}

#[test]
fn scenario_b_absent_reading_mid_visit_changes_nothing() {
    let mut d = recording(scenario_a_cfg());
    feed(&mut d, [0], 0.0);
    feed(&mut d, 1..=4, 4_200.0);
    feed(&mut d, [5], 4_500.0);
    assert_eq!(d.state(), DetectionState::CatPresent);

    let before = format!("{d:?}");
    let emitted = d.sink().snapshots().len();

    assert_eq!(
        d.on_reading(Reading::absent(6 * S)),
        Ok(DetectionState::CatPresent)
    );
    assert_eq!(
        d.on_reading(Reading::new(6 * S, f32::NAN)),
        Ok(DetectionState::CatPresent)
    );

    assert_eq!(format!("{d:?}"), before);
    assert_eq!(d.sink().snapshots().len(), emitted);
    assert_eq!(d.peak_weight(), Some(4_500.0));
    assert_eq!(d.state_entered_at_ms(), 4 * S);
}

#[rstest]
#[case::valid(Reading::new(3 * S, 9_000.0))]
#[case::absent(Reading::absent(3 * S))]
fn scenario_c_out_of_order_is_rejected(#[case] late: Reading) {
    let mut d = recording(scenario_a_cfg());
    feed(&mut d, [0], 0.0);
    feed(&mut d, 1..=5, 4_200.0);
    let before = format!("{d:?}");
    let emitted = d.sink().snapshots().len();

    let err = d.on_reading(late).unwrap_err();
    assert_eq!(
        err,
        DetectorError::OutOfOrderReading {
            at_ms: 3 * S,
            last_ms: 5 * S
        }
    );
    assert_eq!(format!("{d:?}"), before);
    assert_eq!(d.sink().snapshots().len(), emitted);

    // Processing continues normally afterwards
    assert_eq!(
        d.on_reading(Reading::new(6 * S, 4_600.0)),
        Ok(DetectionState::CatPresent)
    );
    assert_eq!(d.peak_weight(), Some(4_600.0));
}

#[rstest]
#[case::peak(CatWeightEstimator::Peak)]
#[case::median(CatWeightEstimator::Median)]
fn round_trip_reports_peak_minus_baseline_and_residue(#[case] estimator: CatWeightEstimator) {
    let (b, t) = (5_000.0f32, 1_000.0f32);
    let cfg = DetectionCfg {
        cat_weight_threshold_g: t,
        cat_weight_estimator: estimator,
        ..DetectionCfg::default()
    };
    let presence_s = cfg.min_presence_ms / S + 1;
    let leave_s = cfg.leave_timeout_ms / S + 1;
    let mut d = LitterboxDetector::new(cfg).expect("valid");

    feed(&mut d, 0..10, b);
    assert_eq!(d.baseline(), b);

    let cat_start = 10;
    let cat_end = cat_start + presence_s;
    feed(&mut d, cat_start..=cat_end, b + t + 500.0);
    assert_eq!(d.state(), DetectionState::CatPresent);

    feed(&mut d, cat_end + 1..=cat_end + 1 + leave_s, b + 50.0);
    assert_eq!(d.state(), DetectionState::Idle);
    assert_eq!(d.visits_finalized(), 1);
    assert_eq!(d.cat_weight(), Some(t + 500.0));
    let waste = d.waste_weight().expect("finalized");
    assert!((waste - 50.0).abs() < 1e-3, "waste={waste}");
    assert_eq!(d.baseline(), b + 50.0);
}

#[test]
fn short_excursion_is_abandoned_without_results() {
    let mut d = recording(scenario_a_cfg());
    feed(&mut d, 0..5, 100.0);
    feed(&mut d, 5..=7, 4_000.0);
    assert_eq!(d.state(), DetectionState::WaitingForConfirmation);
    assert_eq!(d.pre_cat_baseline(), Some(100.0));

    assert_eq!(feed(&mut d, [8], 100.0), DetectionState::Idle);
    assert_eq!(d.pre_cat_baseline(), None);
    assert_eq!(d.cat_weight(), None);
    assert_eq!(d.waste_weight(), None);
    assert_eq!(d.visits_finalized(), 0);
}

#[test]
fn bounce_during_after_cat_is_one_visit() {
    let mut d = recording(scenario_a_cfg());
    feed(&mut d, [0], 0.0);
    feed(&mut d, 1..=4, 4_200.0);
    feed(&mut d, [5], 4_600.0);

    // Cat steps out for 20 s, then back in (lighter paw on the rim)
    feed(&mut d, 6..=25, 70.0);
    assert_eq!(d.state(), DetectionState::AfterCat);
    assert_eq!(feed(&mut d, [26], 4_100.0), DetectionState::CatPresent);
    assert_eq!(d.peak_weight(), Some(4_600.0));
    assert_eq!(d.pre_cat_baseline(), Some(0.0));

    feed(&mut d, 27..=30, 4_300.0);
    feed(&mut d, 31..=80, 75.0);
    assert_eq!(d.state(), DetectionState::Idle);
    assert_eq!(d.visits_finalized(), 1);
    assert_eq!(d.cat_weight(), Some(4_600.0));
    assert_eq!(d.waste_weight(), Some(75.0));

    let finalized = d
        .sink()
        .snapshots()
        .iter()
        .filter(|s| s.cat_weight_g.is_some())
        .count();
    assert_eq!(finalized, 1);
}

#[test]
fn unstable_after_cat_delays_finalization() {
    let mut d = LitterboxDetector::new(scenario_a_cfg()).expect("valid");
    feed(&mut d, [0], 0.0);
    feed(&mut d, 1..=5, 4_200.0);

    // Litter still settling: alternating readings, spread far above 10 g
    for t in 6..=60 {
        let g = if t % 2 == 0 { 40.0 } else { 120.0 };
        d.on_reading(Reading::new(t * S, g)).expect("in order");
    }
    assert_eq!(d.state(), DetectionState::AfterCat);

    // Settles; old noisy samples are still in the window until retention drops them
    feed(&mut d, 61..=400, 80.0);
    assert_eq!(d.state(), DetectionState::Idle);
    assert_eq!(d.visits_finalized(), 1);
    let waste = d.waste_weight().expect("finalized");
    assert!((waste - 80.0).abs() < 0.5, "waste={waste}");
}

#[test]
fn negative_waste_is_reported_as_is() {
    let mut d = LitterboxDetector::new(scenario_a_cfg()).expect("valid");
    feed(&mut d, 0..5, 3_000.0);
    feed(&mut d, 5..=9, 7_500.0);
    // Litter scooped out while the box was being visited
    feed(&mut d, 10..=60, 2_800.0);
    assert_eq!(d.state(), DetectionState::Idle);
    assert_eq!(d.cat_weight(), Some(4_500.0));
    assert_eq!(d.waste_weight(), Some(-200.0));
}

#[test]
fn median_estimator_ignores_spike() {
    let cfg = DetectionCfg {
        cat_weight_estimator: CatWeightEstimator::Median,
        ..scenario_a_cfg()
    };
    let mut d = LitterboxDetector::new(cfg).expect("valid");
    feed(&mut d, [0], 0.0);
    feed(&mut d, 1..=4, 4_200.0);
    feed(&mut d, [5], 9_000.0);
    feed(&mut d, [6], 4_250.0);
    feed(&mut d, [7], 4_210.0);
    feed(&mut d, [8], 4_220.0);
    assert_eq!(d.peak_weight(), Some(9_000.0));
    feed(&mut d, 9..=60, 30.0);
    assert_eq!(d.state(), DetectionState::Idle);
    // Unconfirmed samples from t=1..3 count too: 4200 x4, 4210, 4220, 4250, 9000
    assert_eq!(d.cat_weight(), Some(4_205.0));
}
