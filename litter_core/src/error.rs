use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("out-of-order reading: at_ms={at_ms} precedes last processed at_ms={last_ms}")]
    OutOfOrderReading { at_ms: u64, last_ms: u64 },
    #[error("insufficient data: stabilization window is empty")]
    InsufficientData,
    #[error("invalid state: {0}")]
    State(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
