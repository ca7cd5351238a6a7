pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// A producer of raw weight samples (grams).
///
/// `Ok(None)` means the sensor answered but reported "unavailable"/"unknown".
/// `Err` is a transport failure (timeout, closed pipe, parse error).
pub trait WeightSource {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<f32>, Box<dyn std::error::Error + Send + Sync>>;

    /// True once the source can never produce another sample (e.g. EOF).
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<W: WeightSource + ?Sized> WeightSource for Box<W> {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<f32>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(timeout)
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}
