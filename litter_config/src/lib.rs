#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and recorded-readings parsing for the litterbox scale.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The readings CSV loader enforces headers and maps "unavailable" markers
//!   to absent readings so replays see the same gaps the live sensor had.
use serde::Deserialize;
use serde::de::Deserializer;

/// Recorded readings CSV schema.
///
/// Expected headers:
/// at_ms,grams
///
/// Example:
/// at_ms,grams
/// 0,5012.5
/// 1000,
/// 2000,unavailable
/// 3000,5013.0
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ReadingRow {
    pub at_ms: u64,
    #[serde(deserialize_with = "de_optional_grams")]
    pub grams: Option<f32>,
}

/// How the cat's weight is estimated from the presence samples.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatWeightEstimator {
    /// Highest reading seen while the cat was on the scale.
    #[default]
    Peak,
    /// Median of the readings taken while the cat was on the scale.
    Median,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DetectionCfg {
    /// Grams above baseline that flag possible presence.
    pub cat_weight_threshold_g: f32,
    /// Weight must stay above the presence threshold this long to confirm a cat.
    pub min_presence_ms: u64,
    /// Weight must stay below threshold and settled this long to finalize a visit.
    pub leave_timeout_ms: u64,
    /// Max standard deviation (grams) over the stabilization window to accept a baseline.
    pub after_cat_std_dev_g: f32,
    /// History span kept by the stabilization window (ms). Raised to leave_timeout_ms if shorter.
    pub stabilization_window_ms: u64,
    /// Minimum samples in the window before it may report stable.
    pub min_stable_samples: usize,
    /// Optional cap on a confirmed presence; longer excursions are discarded.
    pub max_visit_ms: Option<u64>,
    pub cat_weight_estimator: CatWeightEstimator,
}

impl Default for DetectionCfg {
    fn default() -> Self {
        Self {
            cat_weight_threshold_g: 1000.0,
            min_presence_ms: 4_000,
            leave_timeout_ms: 120_000,
            after_cat_std_dev_g: 50.0,
            stabilization_window_ms: 300_000,
            min_stable_samples: 5,
            max_visit_ms: None,
            cat_weight_estimator: CatWeightEstimator::Peak,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceCfg {
    /// Max time a live source read may block before it is retried
    pub read_timeout_ms: u64,
    /// Warn when no valid reading arrived for this long (0 disables)
    pub stall_warn_ms: u64,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            read_timeout_ms: 1_000,
            stall_warn_ms: 30_000,
        }
    }
}

/// Last-known visit results, seeded into the detector at startup.
#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct Restore {
    pub cat_weight_g: Option<f32>,
    pub waste_weight_g: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionCfg,
    pub logging: Logging,
    pub source: SourceCfg,
    pub restore: Option<Restore>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GramsCell {
    Number(f32),
    Text(String),
}

/// Markers a host uses when the sensor has no value.
const ABSENT_MARKERS: [&str; 4] = ["", "unavailable", "unknown", "none"];

fn de_optional_grams<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell: Option<GramsCell> = Option::deserialize(deserializer)?;
    match cell {
        None => Ok(None),
        Some(GramsCell::Number(g)) if g.is_finite() => Ok(Some(g)),
        Some(GramsCell::Number(_)) => Ok(None),
        Some(GramsCell::Text(s)) => parse_grams(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse one textual sensor value.
///
/// Absent markers (and non-finite numbers) yield `Ok(None)`; anything else
/// that is not a number is an error.
pub fn parse_grams(text: &str) -> Result<Option<f32>, String> {
    let t = text.trim();
    if ABSENT_MARKERS.iter().any(|m| t.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    t.parse::<f32>()
        .map(|g| g.is_finite().then_some(g))
        .map_err(|_| format!("grams is not a number: {t:?}"))
}

pub fn load_readings_csv(path: &std::path::Path) -> eyre::Result<Vec<ReadingRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open readings CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["at_ms", "grams"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "readings CSV must have headers 'at_ms,grams', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ReadingRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        let d = &self.detection;

        // Detection
        if !(d.cat_weight_threshold_g.is_finite() && d.cat_weight_threshold_g > 0.0) {
            eyre::bail!("detection.cat_weight_threshold_g must be > 0");
        }
        if d.min_presence_ms == 0 {
            eyre::bail!("detection.min_presence_ms must be > 0");
        }
        if d.leave_timeout_ms == 0 {
            eyre::bail!("detection.leave_timeout_ms must be > 0");
        }
        if d.leave_timeout_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("detection.leave_timeout_ms is unreasonably large (>24h)");
        }
        if !(d.after_cat_std_dev_g.is_finite() && d.after_cat_std_dev_g > 0.0) {
            eyre::bail!("detection.after_cat_std_dev_g must be > 0");
        }
        if d.stabilization_window_ms == 0 {
            eyre::bail!("detection.stabilization_window_ms must be > 0");
        }
        if d.min_stable_samples < 2 {
            eyre::bail!("detection.min_stable_samples must be >= 2");
        }
        if d.max_visit_ms == Some(0) {
            eyre::bail!("detection.max_visit_ms must be > 0 when set");
        }

        // Source
        if self.source.read_timeout_ms == 0 {
            eyre::bail!("source.read_timeout_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Restore
        if let Some(r) = &self.restore {
            let bad = |v: Option<f32>| v.is_some_and(|g| !g.is_finite());
            if bad(r.cat_weight_g) || bad(r.waste_weight_g) {
                eyre::bail!("restore values must be finite numbers");
            }
        }

        Ok(())
    }
}
