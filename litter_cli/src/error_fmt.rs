//! Human-readable error descriptions and structured JSON error formatting.

use litter_core::DetectorError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(de) = err.downcast_ref::<DetectorError>() {
        return match de {
            DetectorError::InvalidConfiguration(msg) => format!(
                "What happened: Invalid detection configuration ({msg}).\nLikely causes: A zero or negative value in [detection].\nHow to fix: Edit the config file, then rerun `litter self-check`."
            ),
            DetectorError::OutOfOrderReading { at_ms, last_ms } => format!(
                "What happened: Reading at {at_ms} ms is older than the previous one at {last_ms} ms.\nLikely causes: The readings file is not sorted by at_ms, or two recordings were concatenated.\nHow to fix: Sort the file by at_ms (timestamps must never go backwards) and replay again."
            ),
            DetectorError::InsufficientData | DetectorError::State(_) => format!(
                "What happened: Internal detector error ({de}).\nLikely causes: A bug in the detector.\nHow to fix: Re-run with --log-level=debug and report the readings that trigger it."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML for this tool.\nDetails: {}\nHow to fix: Compare with etc/litter_config.toml; unknown sections are ignored but types must match.",
            te.message()
        );
    }

    // String-based heuristics for errors coming from config or file loading
    let chain = format!("{err:#}");
    let lower = chain.to_ascii_lowercase();

    if lower.contains("readings csv must have headers") {
        return "Invalid headers in readings CSV. Expected 'at_ms,grams'.".to_string();
    }

    if lower.contains("invalid csv row") {
        return format!(
            "What happened: A row in the readings CSV could not be parsed.\nDetails: {chain}\nHow to fix: at_ms must be a whole number of milliseconds; grams a number, empty, or 'unavailable'."
        );
    }

    if lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid.\nDetails: {chain}\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file.\nDetails: {chain}\nHow to fix: Pass --config <FILE> or create etc/litter_config.toml."
        );
    }

    // Generic fallback
    format!(
        "Something went wrong.\nHow to fix: Re-run with --log-level=debug for details. Original: {chain}"
    )
}

/// Stable exit codes for detector errors; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<DetectorError>() {
        Some(DetectorError::OutOfOrderReading { .. }) => 3,
        Some(DetectorError::InvalidConfiguration(_)) => 4,
        Some(DetectorError::InsufficientData | DetectorError::State(_)) => 5,
        None => 1,
    }
}

pub fn error_reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<DetectorError>() {
        Some(DetectorError::OutOfOrderReading { .. }) => "OutOfOrderReading",
        Some(DetectorError::InvalidConfiguration(_)) => "InvalidConfiguration",
        Some(DetectorError::InsufficientData) => "InsufficientData",
        Some(DetectorError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = error_reason_name(err);
    let msg = humanize(err);
    match err.downcast_ref::<DetectorError>() {
        Some(DetectorError::OutOfOrderReading { at_ms, last_ms }) => json!({
            "event": "error",
            "reason": reason,
            "details": { "at_ms": at_ms, "last_ms": last_ms },
            "message": msg,
        })
        .to_string(),
        _ => json!({ "event": "error", "reason": reason, "message": msg }).to_string(),
    }
}
