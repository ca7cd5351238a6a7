//! Sampler thread lifecycle and the live runner.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use litter_core::mocks::{ScriptedSource, SilentSource};
use litter_core::runner::{LiveOptions, run_live};
use litter_core::sampler::{Sampler, SamplerPoll};
use litter_core::source::LineSource;
use litter_core::{DetectionCfg, DetectionState, LitterboxDetector};
use litter_traits::{ManualClock, MonotonicClock};

fn opts() -> LiveOptions {
    LiveOptions {
        poll: Duration::from_millis(20),
        stall_warn_ms: 0,
    }
}

#[test]
fn live_run_finalizes_a_visit_from_a_scripted_scale() {
    let mut script = vec![Some(0.0)];
    script.extend([Some(4_200.0); 4]);
    script.push(Some(4_500.0));
    script.push(Some(50.0));
    script.push(None);
    script.extend([Some(60.0); 50]);
    let total = script.len();

    let clock = ManualClock::new();
    let source = ScriptedSource::new(script).with_clock(clock.clone(), Duration::from_secs(1));
    let sampler = Sampler::spawn(source, Duration::from_millis(10), clock);

    let cfg = DetectionCfg {
        cat_weight_threshold_g: 900.0,
        min_presence_ms: 3_000,
        leave_timeout_ms: 45_000,
        after_cat_std_dev_g: 10.0,
        ..DetectionCfg::default()
    };
    let mut d = LitterboxDetector::new(cfg).unwrap();
    let stop = AtomicBool::new(false);

    let summary = run_live(&sampler, &mut d, &stop, opts()).unwrap();
    assert_eq!(summary.readings, total);
    assert_eq!(summary.absent, 1);
    assert_eq!(summary.rejected, 0);
    assert_eq!(summary.visits, 1);
    assert_eq!(summary.final_snapshot.state, DetectionState::Idle);
    assert_eq!(summary.final_snapshot.cat_weight_g, Some(4_500.0));
    assert_eq!(summary.final_snapshot.waste_weight_g, Some(60.0));
}

#[test]
fn scripted_readings_are_stamped_by_the_clock() {
    let clock = ManualClock::new();
    let source = ScriptedSource::new([Some(1.0), None, Some(3.0)])
        .with_clock(clock.clone(), Duration::from_millis(250));
    let sampler = Sampler::spawn(source, Duration::from_millis(10), clock);

    let mut stamps = Vec::new();
    loop {
        match sampler.poll(Duration::from_secs(1)) {
            SamplerPoll::Reading(r) => stamps.push((r.at_ms, r.grams)),
            SamplerPoll::Pending => {}
            SamplerPoll::Closed => break,
        }
    }
    assert_eq!(
        stamps,
        vec![(250, Some(1.0)), (500, None), (750, Some(3.0))]
    );
    // Absent readings do not count as a sign of life
    assert_eq!(sampler.last_ok_ms(), 750);
    assert_eq!(sampler.stalled_for(1_000), 250);
}

#[test]
fn sampler_thread_exits_on_drop() {
    let sampler = Sampler::spawn(SilentSource, Duration::from_millis(20), MonotonicClock::new());
    std::thread::sleep(Duration::from_millis(30));
    let started = Instant::now();
    drop(sampler);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn stop_flag_ends_a_silent_live_run() {
    let sampler = Sampler::spawn(SilentSource, Duration::from_millis(20), MonotonicClock::new());
    let mut d = LitterboxDetector::new(DetectionCfg::default()).unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    let flag = stop.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(150));
        flag.store(true, Ordering::Relaxed);
    });

    let summary = run_live(
        &sampler,
        &mut d,
        &stop,
        LiveOptions {
            poll: Duration::from_millis(20),
            stall_warn_ms: 50,
        },
    )
    .unwrap();
    stopper.join().unwrap();

    assert_eq!(summary.readings, 0);
    assert_eq!(summary.final_snapshot.state, DetectionState::Idle);
    assert!(sampler.stalled_for_now() >= 50);
}

#[test]
fn line_source_feeds_the_detector() {
    let input = "# baseline\n5000\n5001\nunavailable\n4999\n";
    let sampler = Sampler::spawn(
        LineSource::spawn(Cursor::new(input)),
        Duration::from_millis(50),
        MonotonicClock::new(),
    );
    let mut d = LitterboxDetector::new(DetectionCfg::default()).unwrap();
    let stop = AtomicBool::new(false);

    let summary = run_live(&sampler, &mut d, &stop, opts()).unwrap();
    assert_eq!(summary.readings, 4);
    assert_eq!(summary.absent, 1);
    assert_eq!(summary.final_snapshot.state, DetectionState::Idle);
    assert_eq!(summary.final_snapshot.baseline_g, 5_000.0);
}
