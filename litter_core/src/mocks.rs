//! Test and helper sources for litter_core

use std::collections::VecDeque;
use std::time::Duration;

use litter_traits::{Clock, ManualClock, WeightSource};

/// Plays back a fixed list of sensor answers, then reports exhaustion.
///
/// With `with_clock`, every read advances the shared `ManualClock` by `step`
/// so a `Sampler` stamps readings at deterministic times.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    values: VecDeque<Option<f32>>,
    clock: Option<(ManualClock, Duration)>,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = Option<f32>>>(values: I) -> Self {
        Self {
            values: values.into_iter().collect(),
            clock: None,
        }
    }

    pub fn with_clock(mut self, clock: ManualClock, step: Duration) -> Self {
        self.clock = Some((clock, step));
        self
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl WeightSource for ScriptedSource {
    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<f32>, Box<dyn std::error::Error + Send + Sync>> {
        let v = self
            .values
            .pop_front()
            .ok_or_else(|| std::io::Error::other("script exhausted"))?;
        if let Some((clock, step)) = &self.clock {
            clock.sleep(*step);
        }
        Ok(v)
    }

    fn is_exhausted(&self) -> bool {
        self.values.is_empty()
    }
}

/// A source that never produces a sample; every read fails after `timeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSource;

impl WeightSource for SilentSource {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<f32>, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(timeout);
        Err(Box::new(std::io::Error::other("silent source")))
    }
}
