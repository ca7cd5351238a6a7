#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Litterbox presence detection (hardware-agnostic).
//!
//! This crate turns a stream of timestamped weight readings into an empty-box
//! baseline, confirmed cat visits, and the waste mass left behind by each visit.
//! Readings arrive through `on_reading`; results leave through a `ResultSink`.
//!
//! ## Architecture
//!
//! - **Stabilization**: time-bounded window answering "has the scale settled?" (`stabilization`)
//! - **Baseline**: empty-box weight, updated only while idle (`baseline`)
//! - **Visit**: peak/median tracking and result computation (`visit`)
//! - **Detection**: presence state machine with hysteresis and debounce (`detector`)
//! - **Host plumbing**: replay/live runners and a threaded sampler (`runner`, `sampler`, `source`)
//!
//! ## Time
//!
//! All timing is logical: each `Reading` carries milliseconds since a
//! host-chosen epoch and the detector compares those stamps, never the wall
//! clock. Feeding `(at_ms, grams)` pairs is enough to drive every timer.

pub mod baseline;
pub mod config;
pub mod conversions;
pub mod detector;
pub mod error;
pub mod mocks;
pub mod runner;
pub mod sampler;
pub mod sink;
pub mod source;
pub mod stabilization;
pub mod state;
pub mod types;
pub mod util;
pub mod visit;

pub use baseline::BaselineTracker;
pub use config::{CatWeightEstimator, DetectionCfg};
pub use detector::{DetectorBuilder, LitterboxDetector};
pub use error::{DetectorError, Report, Result};
pub use sink::{NullSink, RecordingSink, ResultSink};
pub use stabilization::StabilizationWindow;
pub use state::DetectionState;
pub use types::{Reading, Snapshot, VisitResult};
pub use visit::VisitAccumulator;
