//! Spectral analysis: transforms, power spectra and windowing

pub mod analysis;
pub mod czt;
pub mod fft;
pub mod power;
pub mod windowing;

pub use analysis::{AnalyzerConfig, SpectrumAnalyzer};
pub use czt::{czt, dft, evaluate, invert, ChirpTable, ChirpZ, ContourSpec, SpectrumResult};
pub use fft::{FftPrimitive, RealFftEngine, RustFft};
pub use power::{to_decibels, to_power_spectrum, PowerScaling, PowerSpectrum, Sidedness};
pub use windowing::{apply_window, WindowType};
