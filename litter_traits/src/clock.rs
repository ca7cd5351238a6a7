//! Time sources for stamping live readings.
//!
//! The detector itself never looks at a clock: every `Reading` carries its
//! own `at_ms`. A clock is only needed where readings are born, i.e. the
//! sampler thread that turns raw sensor answers into timestamped readings.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Where the sampler gets "now" from.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Pause the calling thread; simulated clocks may just move time forward.
    fn sleep(&self, d: Duration);

    /// Logical timestamp for a reading taken now: whole milliseconds since
    /// `epoch`, or 0 if `epoch` lies in the future.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-time stamps for `watch`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

/// Hand-driven clock for scripted feeds.
///
/// A `ScriptedSource` holds one handle and steps it once per sample while the
/// `Sampler` stamps with another, so a test decides exactly which `at_ms`
/// each reading gets. Handles are cheap clones over one shared millisecond
/// counter.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: Instant,
    elapsed_ms: Arc<AtomicU64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Move every handle forward by `d` (millisecond resolution).
    pub fn advance(&self, d: Duration) {
        let step = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        let _ = self
            .elapsed_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |ms| {
                Some(ms.saturating_add(step))
            });
    }

    /// Jump to `d` after the clock's creation.
    pub fn set_offset(&self, d: Duration) {
        let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms.store(ms, Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + Duration::from_millis(self.elapsed_ms.load(Ordering::Acquire))
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
