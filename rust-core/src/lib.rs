//! CZT Spectrum - Arbitrary-Length Spectral Analysis Core
//!
//! Chirp z-transform (Bluestein) for spectra of any length, power and
//! power-spectral-density normalization, and fractional-octave band levels.

pub mod bands;
pub mod error;
pub mod signal;
pub mod spectrum;

pub use bands::{BandLevel, BandPower, BandWeighting, OctaveBand, OctaveBase};
pub use error::{Result, SpectrumError};
pub use signal::Signal;
pub use spectrum::{AnalyzerConfig, ContourSpec, SpectrumAnalyzer, SpectrumResult, WindowType};
