//! Command bodies: detector assembly, replay, live watch and self-check.

use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use litter_core::runner::{self, LiveOptions};
use litter_core::sampler::Sampler;
use litter_core::source::LineSource;
use litter_core::{DetectionCfg, LitterboxDetector, Reading, ResultSink, Snapshot};
use litter_traits::MonotonicClock;
use serde_json::json;

/// Prints each snapshot change to stdout, pretty or as JSON lines.
pub struct PrintSink {
    json: bool,
}

impl PrintSink {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

fn fmt_grams(v: Option<f32>) -> String {
    v.map_or_else(|| "-".to_string(), |g| format!("{g:.1} g"))
}

impl ResultSink for PrintSink {
    fn on_state_change(&mut self, s: &Snapshot) {
        let line = if self.json {
            json!({
                "event": "snapshot",
                "state": s.state.as_str(),
                "baseline_g": s.baseline_g,
                "cat_weight_g": s.cat_weight_g,
                "waste_weight_g": s.waste_weight_g,
            })
            .to_string()
        } else {
            format!(
                "{:<24} baseline {:>9.1} g  cat {:>10}  waste {:>10}",
                s.state.as_str(),
                s.baseline_g,
                fmt_grams(s.cat_weight_g),
                fmt_grams(s.waste_weight_g)
            )
        };
        // A closed stdout (e.g. piped into `head`) must not abort detection
        let _ = writeln!(std::io::stdout().lock(), "{line}");
    }
}

pub fn build_detector(
    cfg: &litter_config::Config,
    json: bool,
) -> eyre::Result<LitterboxDetector<PrintSink>> {
    let detection: DetectionCfg = (&cfg.detection).into();
    let restore = cfg.restore.unwrap_or_default();
    let detector = LitterboxDetector::builder()
        .with_config(detection)
        .with_restored(restore.cat_weight_g, restore.waste_weight_g)
        .with_sink(PrintSink::new(json))
        .build()?;
    Ok(detector)
}

pub fn run_replay(cfg: &litter_config::Config, readings: &Path, json: bool) -> eyre::Result<()> {
    let rows = litter_config::load_readings_csv(readings)
        .wrap_err_with(|| format!("load readings {}", readings.display()))?;
    tracing::info!(rows = rows.len(), file = %readings.display(), "replay start");

    let mut detector = build_detector(cfg, json)?;
    let summary = runner::replay(&mut detector, rows.iter().map(Reading::from))?;

    let s = summary.final_snapshot;
    if json {
        println!(
            "{}",
            json!({
                "event": "summary",
                "readings": summary.readings,
                "absent": summary.absent,
                "visits": summary.visits,
                "state": s.state.as_str(),
                "baseline_g": s.baseline_g,
                "cat_weight_g": s.cat_weight_g,
                "waste_weight_g": s.waste_weight_g,
            })
        );
    } else {
        println!(
            "replayed {} readings ({} absent), {} visit(s); final state {}, baseline {:.1} g, cat {}, waste {}",
            summary.readings,
            summary.absent,
            summary.visits,
            s.state,
            s.baseline_g,
            fmt_grams(s.cat_weight_g),
            fmt_grams(s.waste_weight_g)
        );
    }
    Ok(())
}

pub fn run_watch(
    cfg: &litter_config::Config,
    json: bool,
    stop: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let mut detector = build_detector(cfg, json)?;
    let source = LineSource::spawn(BufReader::new(std::io::stdin()));
    let sampler = Sampler::spawn(
        source,
        Duration::from_millis(cfg.source.read_timeout_ms),
        MonotonicClock::new(),
    );
    let opts = LiveOptions {
        stall_warn_ms: cfg.source.stall_warn_ms,
        ..LiveOptions::default()
    };

    let summary = runner::run_live(&sampler, &mut detector, &stop, opts)?;
    let s = summary.final_snapshot;
    if json {
        println!(
            "{}",
            json!({
                "event": "summary",
                "readings": summary.readings,
                "absent": summary.absent,
                "rejected": summary.rejected,
                "visits": summary.visits,
                "state": s.state.as_str(),
                "baseline_g": s.baseline_g,
                "cat_weight_g": s.cat_weight_g,
                "waste_weight_g": s.waste_weight_g,
            })
        );
    } else {
        println!(
            "watched {} readings ({} absent, {} rejected), {} visit(s); final state {}",
            summary.readings, summary.absent, summary.rejected, summary.visits, s.state
        );
    }
    Ok(())
}

pub fn run_self_check(cfg: &litter_config::Config, json: bool) -> eyre::Result<()> {
    let d: DetectionCfg = (&cfg.detection).into();
    d.validate()?;
    let estimator = match d.cat_weight_estimator {
        litter_core::CatWeightEstimator::Peak => "peak",
        litter_core::CatWeightEstimator::Median => "median",
    };
    if json {
        println!(
            "{}",
            json!({
                "event": "self_check",
                "ok": true,
                "cat_weight_threshold_g": d.cat_weight_threshold_g,
                "min_presence_ms": d.min_presence_ms,
                "leave_timeout_ms": d.leave_timeout_ms,
                "after_cat_std_dev_g": d.after_cat_std_dev_g,
                "retention_ms": d.retention_ms(),
                "max_visit_ms": d.max_visit_ms,
                "cat_weight_estimator": estimator,
            })
        );
    } else {
        println!(
            "config ok: threshold {} g, min presence {} ms, leave timeout {} ms, max std dev {} g, window {} ms, estimator {estimator}",
            d.cat_weight_threshold_g,
            d.min_presence_ms,
            d.leave_timeout_ms,
            d.after_cat_std_dev_g,
            d.retention_ms()
        );
    }
    Ok(())
}
