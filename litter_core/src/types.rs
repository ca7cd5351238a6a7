//! Values flowing into and out of the detector.

use crate::state::DetectionState;

/// One sample from the reading source.
///
/// `at_ms` is logical time in milliseconds since a host-chosen epoch.
/// `grams == None` marks a sample the sensor reported as unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub at_ms: u64,
    pub grams: Option<f32>,
}

impl Reading {
    #[inline]
    pub const fn new(at_ms: u64, grams: f32) -> Self {
        Self {
            at_ms,
            grams: Some(grams),
        }
    }

    #[inline]
    pub const fn absent(at_ms: u64) -> Self {
        Self { at_ms, grams: None }
    }

    /// The usable value, if any. Non-finite numbers count as absent.
    #[inline]
    pub fn value(&self) -> Option<f32> {
        self.grams.filter(|g| g.is_finite())
    }
}

/// Outcome of one finalized visit. Negative values are reported as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitResult {
    pub cat_weight_g: f32,
    pub waste_weight_g: f32,
}

/// Full view handed to the result sink whenever any field changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub state: DetectionState,
    pub baseline_g: f32,
    /// Latest known cat weight; `None` until a visit finalizes or a value is restored.
    pub cat_weight_g: Option<f32>,
    /// Latest known waste weight; `None` until a visit finalizes or a value is restored.
    pub waste_weight_g: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::Reading;

    #[test]
    fn non_finite_values_are_absent() {
        assert_eq!(Reading::new(0, f32::NAN).value(), None);
        assert_eq!(Reading::new(0, f32::INFINITY).value(), None);
        assert_eq!(Reading::absent(0).value(), None);
        assert_eq!(Reading::new(0, 12.5).value(), Some(12.5));
    }
}
