//! Background sampling of a live weight source.
//!
//! Spawns a thread that owns the `WeightSource`, stamps every answer with
//! logical time from the supplied clock, and pushes `Reading`s through a
//! bounded channel. The last time a valid (non-absent) reading arrived is
//! tracked for stall warnings.
//!
//! Each `Sampler` owns exactly one thread, which is shut down and joined
//! when the `Sampler` is dropped.
use crossbeam_channel as xch;
use litter_traits::{Clock, WeightSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::types::Reading;

const CHANNEL_CAPACITY: usize = 64;
/// How long a blocked send waits before re-checking the shutdown flag.
const SEND_RETRY: Duration = Duration::from_millis(50);

/// Outcome of waiting on the sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerPoll {
    Reading(Reading),
    /// Nothing arrived within the wait.
    Pending,
    /// The source is exhausted and every reading has been consumed.
    Closed,
}

pub struct Sampler {
    rx: xch::Receiver<Reading>,
    last_ok: Arc<AtomicU64>,
    epoch: Instant,
    clock: Arc<dyn Clock + Send + Sync>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Start sampling. `timeout` bounds each `source.read` call so the
    /// thread notices shutdown promptly.
    pub fn spawn<S, C>(mut source: S, timeout: Duration, clock: C) -> Self
    where
        S: WeightSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(clock);
        let thread_clock = clock.clone();
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }
                if source.is_exhausted() {
                    tracing::debug!("weight source exhausted");
                    break;
                }

                match source.read(timeout) {
                    Ok(grams) => {
                        let at_ms = thread_clock.ms_since(epoch);
                        let reading = Reading { at_ms, grams };
                        if reading.value().is_some() {
                            last_ok_clone.store(at_ms, Ordering::Relaxed);
                        }
                        if !send_until_shutdown(&tx, reading, &shutdown_clone) {
                            tracing::debug!("sampler consumer gone, exiting thread");
                            break;
                        }
                    }
                    Err(e) => {
                        // Transient; the stall warning covers a source that keeps failing
                        tracing::trace!(error = %e, "weight source read failed");
                    }
                }
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            epoch,
            clock,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Wait up to `timeout` for the next reading.
    pub fn poll(&self, timeout: Duration) -> SamplerPoll {
        match self.rx.recv_timeout(timeout) {
            Ok(r) => SamplerPoll::Reading(r),
            Err(xch::RecvTimeoutError::Timeout) => SamplerPoll::Pending,
            Err(xch::RecvTimeoutError::Disconnected) => SamplerPoll::Closed,
        }
    }

    /// Logical time of the last valid reading (0 if none yet).
    pub fn last_ok_ms(&self) -> u64 {
        self.last_ok.load(Ordering::Relaxed)
    }

    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok_ms())
    }

    /// Stall measured against this sampler's own clock and epoch.
    pub fn stalled_for_now(&self) -> u64 {
        self.stalled_for(self.clock.ms_since(self.epoch))
    }
}

/// Blocking send that gives up when shutdown is requested or the receiver is gone.
fn send_until_shutdown(tx: &xch::Sender<Reading>, mut reading: Reading, shutdown: &AtomicBool) -> bool {
    loop {
        match tx.send_timeout(reading, SEND_RETRY) {
            Ok(()) => return true,
            Err(xch::SendTimeoutError::Timeout(back)) => {
                if shutdown.load(Ordering::Relaxed) {
                    return false;
                }
                reading = back;
            }
            Err(xch::SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Exits after the in-flight read (bounded by its timeout) or send retry
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("sampler thread joined"),
                Err(e) => tracing::warn!(?e, "sampler thread panicked during shutdown"),
            }
        }
    }
}
