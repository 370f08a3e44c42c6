//! Error taxonomy for the spectral engine
//!
//! Every failure is a classification the caller can match on. Nothing here
//! is fatal to the host process.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("Invalid length: {what} must be at least 1 (got {len})")]
    InvalidLength { what: &'static str, len: usize },

    #[error("Degenerate contour: {0}")]
    DegenerateContour(String),

    #[error("Invalid decibel reference {0}: must be finite and > 0")]
    InvalidReference(f64),

    #[error("Invalid sample rate {0} Hz: must be finite and > 0")]
    InvalidSampleRate(f64),

    #[error("Length mismatch: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Contour cannot be inverted: {0}")]
    NonInvertibleContour(String),

    #[error("One-sided spectrum unsupported: {0}")]
    OneSidedUnsupported(&'static str),

    #[error("Invalid frequency axis: {0}")]
    InvalidFrequencyAxis(String),

    #[error("Invalid band: {0}")]
    InvalidBand(String),
}

pub type Result<T> = std::result::Result<T, SpectrumError>;
