//! Detection states exposed to the host.

use std::fmt;

/// Where the presence state machine currently is.
///
/// The string names and the order of `ALL` are part of the host contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DetectionState {
    /// Box is empty; baseline may drift.
    #[default]
    Idle,
    /// Weight crossed the presence threshold; debounce timer running.
    WaitingForConfirmation,
    /// Presence confirmed; peak is being tracked.
    CatPresent,
    /// Weight fell below threshold; waiting for the scale to settle.
    AfterCat,
}

impl DetectionState {
    pub const ALL: [Self; 4] = [
        Self::Idle,
        Self::WaitingForConfirmation,
        Self::CatPresent,
        Self::AfterCat,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::WaitingForConfirmation => "waiting_for_confirmation",
            Self::CatPresent => "cat_present",
            Self::AfterCat => "after_cat",
        }
    }
}

impl fmt::Display for DetectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::DetectionState;

    #[test]
    fn vocabulary_is_stable() {
        let names: Vec<&str> = DetectionState::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            ["idle", "waiting_for_confirmation", "cat_present", "after_cat"]
        );
        assert_eq!(DetectionState::default(), DetectionState::Idle);
        assert_eq!(DetectionState::AfterCat.to_string(), "after_cat");
    }
}
