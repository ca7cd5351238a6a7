//! Drivers that feed a detector: recorded replay and a live sampler loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;

use crate::detector::LitterboxDetector;
use crate::error::{DetectorError, Report, Result};
use crate::sampler::{Sampler, SamplerPoll};
use crate::sink::ResultSink;
use crate::types::{Reading, Snapshot};

/// Totals for one replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplaySummary {
    pub readings: usize,
    pub absent: usize,
    /// Visits finalized during this replay.
    pub visits: u64,
    pub final_snapshot: Snapshot,
}

/// Feed recorded readings in order. Stops at the first rejected reading,
/// reporting its position in the input.
pub fn replay<K, I>(detector: &mut LitterboxDetector<K>, readings: I) -> Result<ReplaySummary>
where
    K: ResultSink,
    I: IntoIterator<Item = Reading>,
{
    let visits_before = detector.visits_finalized();
    let mut count = 0usize;
    let mut absent = 0usize;

    for (idx, reading) in readings.into_iter().enumerate() {
        detector
            .on_reading(reading)
            .map_err(Report::new)
            .wrap_err_with(|| format!("reading #{} (at_ms={})", idx + 1, reading.at_ms))?;
        count += 1;
        if reading.value().is_none() {
            absent += 1;
        }
    }

    let summary = ReplaySummary {
        readings: count,
        absent,
        visits: detector.visits_finalized() - visits_before,
        final_snapshot: detector.snapshot(),
    };
    tracing::info!(
        readings = summary.readings,
        absent = summary.absent,
        visits = summary.visits,
        state = %summary.final_snapshot.state,
        "replay complete"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
pub struct LiveOptions {
    /// Max wait for one reading before re-checking `stop` and the stall timer.
    pub poll: Duration,
    /// Warn once when no valid reading arrived for this long. 0 disables.
    pub stall_warn_ms: u64,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            poll: Duration::from_millis(200),
            stall_warn_ms: 30_000,
        }
    }
}

/// Totals for one live run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSummary {
    pub readings: usize,
    pub absent: usize,
    /// Out-of-order readings skipped.
    pub rejected: usize,
    pub visits: u64,
    pub final_snapshot: Snapshot,
}

/// Drain `sampler` into `detector` until the source closes or `stop` is set.
///
/// Out-of-order readings are skipped; any other detector error ends the run.
pub fn run_live<K: ResultSink>(
    sampler: &Sampler,
    detector: &mut LitterboxDetector<K>,
    stop: &AtomicBool,
    opts: LiveOptions,
) -> Result<LiveSummary> {
    let visits_before = detector.visits_finalized();
    let mut readings = 0usize;
    let mut absent = 0usize;
    let mut rejected = 0usize;
    let mut stall_warned = false;

    tracing::info!(
        stall_warn_ms = opts.stall_warn_ms,
        threshold_g = detector.config().cat_weight_threshold_g,
        "watch start"
    );

    while !stop.load(Ordering::Relaxed) {
        match sampler.poll(opts.poll) {
            SamplerPoll::Reading(r) => {
                readings += 1;
                if r.value().is_some() {
                    stall_warned = false;
                } else {
                    absent += 1;
                }
                match detector.on_reading(r) {
                    Ok(_) => {}
                    Err(DetectorError::OutOfOrderReading { .. }) => rejected += 1,
                    Err(e) => {
                        return Err(Report::new(e))
                            .wrap_err_with(|| format!("live reading at_ms={}", r.at_ms));
                    }
                }
            }
            SamplerPoll::Pending => {}
            SamplerPoll::Closed => {
                tracing::info!("reading source closed");
                break;
            }
        }

        if opts.stall_warn_ms > 0 && !stall_warned {
            let stalled_ms = sampler.stalled_for_now();
            if stalled_ms >= opts.stall_warn_ms {
                tracing::warn!(stalled_ms, "no valid reading from the scale");
                stall_warned = true;
            }
        }
    }

    Ok(LiveSummary {
        readings,
        absent,
        rejected,
        visits: detector.visits_finalized() - visits_before,
        final_snapshot: detector.snapshot(),
    })
}
