#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing and validation must reject bad input without panicking.
    if let Ok(cfg) = litter_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        // Anything the file validator accepts, the detector must accept too
        let detection: litter_core::DetectionCfg = (&cfg.detection).into();
        assert!(litter_core::LitterboxDetector::new(detection).is_ok());
    }
});
