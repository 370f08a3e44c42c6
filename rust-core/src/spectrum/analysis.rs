//! High-level spectrum analyzer
//!
//! Combines windowing, the transform and power normalization, then reduces
//! the power spectrum to fractional-octave band levels.

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::czt::{evaluate, ContourSpec};
use super::fft::RealFftEngine;
use super::power::{to_power_spectrum, PowerScaling, PowerSpectrum, Sidedness};
use super::windowing::{apply_window, power_correction_factor, WindowType};
use crate::bands::{BandLevel, BandPartition, BandPower, BandWeighting, OctaveBand};
use crate::error::{Result, SpectrumError};
use crate::signal::Signal;

/// Spectrum analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Window applied before the transform
    pub window: WindowType,

    /// Normalization of squared magnitudes
    pub scaling: PowerScaling,

    pub sidedness: Sidedness,

    /// Reference amplitude for band levels in dB
    pub reference: f64,

    /// Number of frequency points; `None` uses the signal length
    pub resolution: Option<usize>,

    /// Compensate the window's energy loss
    pub apply_correction: bool,

    /// Attribution of bins to bands
    pub weighting: BandWeighting,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window: WindowType::Hann,
            scaling: PowerScaling::PerSample,
            sidedness: Sidedness::OneSided,
            reference: 1.0,
            resolution: None,
            apply_correction: true,
            weighting: BandWeighting::Rectangular,
        }
    }
}

/// Signal-to-band-level pipeline
///
/// Power-of-two real signals analysed at their own length take the real FFT
/// path; every other length goes through the chirp-z transform on the DFT
/// contour, so the signal never has to be padded or truncated.
#[derive(Debug, Clone, Default)]
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
}

impl SpectrumAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn update_config(&mut self, config: AnalyzerConfig) {
        self.config = config;
    }

    /// Windowed and normalized power spectrum of `signal`
    pub fn power_spectrum(&self, signal: &Signal) -> Result<PowerSpectrum> {
        let n = signal.len();
        if n == 0 {
            return Err(SpectrumError::InvalidLength {
                what: "input length",
                len: n,
            });
        }
        let m = self.config.resolution.unwrap_or(n);
        if m == 0 {
            return Err(SpectrumError::InvalidLength {
                what: "resolution",
                len: m,
            });
        }

        let windowed = apply_window(signal, self.config.window);
        let fast_path = windowed.is_real()
            && n.is_power_of_two()
            && m == n
            && self.config.sidedness == Sidedness::OneSided;

        let spectrum = if fast_path {
            debug!(n, "real fft path");
            let engine = RealFftEngine::new(n)?;
            let half = engine.half_spectrum(&windowed.real_samples())?;
            PowerSpectrum::from_half_spectrum(
                &half,
                m,
                n,
                self.config.scaling,
                signal.sample_rate(),
            )?
        } else {
            debug!(n, m, "chirp-z path");
            let result = evaluate(&windowed, &ContourSpec::dft(m))?;
            to_power_spectrum(&result, n, self.config.scaling, self.config.sidedness)?
        };

        if self.config.apply_correction {
            Ok(spectrum.scaled(power_correction_factor(self.config.window, n)))
        } else {
            Ok(spectrum)
        }
    }

    /// Band levels of `signal`, in the order of `bands`
    pub fn band_levels(&self, signal: &Signal, bands: &[OctaveBand]) -> Result<Vec<BandPower>> {
        let spectrum = self.power_spectrum(signal)?;
        BandPartition::new(spectrum.frequencies(), bands, spectrum.sample_rate())?.aggregate(
            spectrum.power(),
            self.config.reference,
            self.config.weighting,
        )
    }

    /// Band levels of several channels, one row per signal
    ///
    /// Channels are analysed in parallel. The first failing channel's error
    /// is returned.
    pub fn band_level_matrix(
        &self,
        signals: &[Signal],
        bands: &[OctaveBand],
    ) -> Result<Array2<BandLevel>> {
        let rows: Vec<Vec<BandPower>> = signals
            .par_iter()
            .map(|signal| self.band_levels(signal, bands))
            .collect::<Result<_>>()?;

        Ok(Array2::from_shape_fn(
            (rows.len(), bands.len()),
            |(channel, band)| rows[channel][band].level,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::OctaveBase;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    fn sine(freq: f64, amplitude: f64, len: usize, sample_rate: f64) -> Signal {
        let samples: Vec<f64> = (0..len)
            .map(|n| amplitude * (2.0 * PI * freq * n as f64 / sample_rate).sin())
            .collect();
        Signal::from_real(&samples, sample_rate).unwrap()
    }

    fn peak_frequency(spectrum: &PowerSpectrum) -> f64 {
        let (peak_idx, _) = spectrum
            .power()
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        spectrum.frequencies()[peak_idx]
    }

    #[test]
    fn test_analyzer_basic() {
        let analyzer = SpectrumAnalyzer::default();
        let spectrum = analyzer
            .power_spectrum(&sine(1000.0, 1.0, 1024, 48000.0))
            .unwrap();

        assert_eq!(spectrum.len(), 513);
        assert!((peak_frequency(&spectrum) - 1000.0).abs() < 48000.0 / 1024.0);
    }

    #[test]
    fn test_non_power_of_two_length() {
        let analyzer = SpectrumAnalyzer::default();
        let spectrum = analyzer
            .power_spectrum(&sine(100.0, 1.0, 1000, 1000.0))
            .unwrap();

        // 1 Hz bins, no padding
        assert_eq!(spectrum.len(), 501);
        assert!((spectrum.frequencies()[1] - 1.0).abs() < 1e-12);
        assert!((peak_frequency(&spectrum) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_paths_agree() {
        let signal = sine(3000.0, 0.5, 256, 48000.0);
        let analyzer = SpectrumAnalyzer::default();
        let fast = analyzer.power_spectrum(&signal).unwrap();

        let windowed = apply_window(&signal, WindowType::Hann);
        let result = evaluate(&windowed, &ContourSpec::dft(256)).unwrap();
        let slow = to_power_spectrum(&result, 256, PowerScaling::PerSample, Sidedness::OneSided)
            .unwrap()
            .scaled(power_correction_factor(WindowType::Hann, 256));

        assert_eq!(fast.len(), slow.len());
        let scale = fast.power().iter().cloned().fold(0.0, f64::max);
        for (a, b) in fast.power().iter().zip(slow.power()) {
            assert!((a - b).abs() < 1e-9 * scale);
        }
        assert_eq!(fast.frequencies(), slow.frequencies());
    }

    #[test]
    fn test_resolution_override() {
        let config = AnalyzerConfig {
            resolution: Some(2048),
            ..Default::default()
        };
        let analyzer = SpectrumAnalyzer::new(config);
        let spectrum = analyzer
            .power_spectrum(&sine(250.0, 1.0, 1000, 8000.0))
            .unwrap();

        assert_eq!(spectrum.len(), 1025);
        assert!((spectrum.frequencies()[1] - 8000.0 / 2048.0).abs() < 1e-12);
        assert!((peak_frequency(&spectrum) - 250.0).abs() < 8000.0 / 2048.0);
    }

    #[test]
    fn test_correction_factor_applied() {
        let signal = sine(440.0, 1.0, 1000, 8000.0);
        let corrected = SpectrumAnalyzer::default().power_spectrum(&signal).unwrap();
        let raw = SpectrumAnalyzer::new(AnalyzerConfig {
            apply_correction: false,
            ..Default::default()
        })
        .power_spectrum(&signal)
        .unwrap();

        let factor = power_correction_factor(WindowType::Hann, 1000);
        let ratio = corrected.total_power() / raw.total_power();
        assert!((ratio - factor).abs() < 1e-9 * factor);
    }

    #[test]
    fn test_band_levels_of_tone() {
        // Rectangular window, mean-square scaling: a √2-amplitude tone on a
        // bin center reads 0 dB in its band
        let config = AnalyzerConfig {
            window: WindowType::Rectangular,
            scaling: PowerScaling::PerSampleSquared,
            ..Default::default()
        };
        let analyzer = SpectrumAnalyzer::new(config);
        let signal = sine(1000.0, 2f64.sqrt(), 8000, 8000.0);
        let bands = OctaveBand::series(250.0, 2000.0, 1, OctaveBase::Base2).unwrap();

        let levels = analyzer.band_levels(&signal, &bands).unwrap();
        for level in &levels {
            let db = level.level.db().unwrap();
            if level.band.contains(1000.0) {
                assert!(db.abs() < 1e-9, "tone band reads {}", db);
            } else {
                assert!(db < -100.0);
            }
        }
    }

    #[test]
    fn test_band_level_matrix() {
        let analyzer = SpectrumAnalyzer::default();
        let signals = vec![
            sine(125.0, 1.0, 4000, 8000.0),
            sine(1000.0, 1.0, 4000, 8000.0),
            sine(1000.0, 0.1, 4000, 8000.0),
        ];
        let bands = OctaveBand::series(125.0, 2000.0, 1, OctaveBase::Base2).unwrap();

        let matrix = analyzer.band_level_matrix(&signals, &bands).unwrap();
        assert_eq!(matrix.dim(), (3, bands.len()));

        for (row, signal) in signals.iter().enumerate() {
            let levels = analyzer.band_levels(signal, &bands).unwrap();
            for (col, level) in levels.iter().enumerate() {
                assert_eq!(matrix[[row, col]], level.level);
            }
        }

        // Amplitude 0.1 sits 20 dB below amplitude 1
        let loud = matrix[[1, 3]].db().unwrap();
        let quiet = matrix[[2, 3]].db().unwrap();
        assert!((loud - quiet - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_matrix_propagates_errors() {
        let analyzer = SpectrumAnalyzer::default();
        let signals = vec![
            sine(125.0, 1.0, 64, 8000.0),
            Signal::from_real(&[], 8000.0).unwrap(),
        ];
        let bands = [OctaveBand::new(1000.0, 1).unwrap()];

        assert!(matches!(
            analyzer.band_level_matrix(&signals, &bands),
            Err(SpectrumError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_complex_input_sidedness() {
        let samples: Vec<Complex64> = (0..100)
            .map(|n| Complex64::from_polar(1.0, 2.0 * PI * 10.0 * n as f64 / 100.0))
            .collect();
        let signal = Signal::from_complex(samples, 100.0).unwrap();

        assert!(matches!(
            SpectrumAnalyzer::default().power_spectrum(&signal),
            Err(SpectrumError::OneSidedUnsupported(_))
        ));

        let analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
            sidedness: Sidedness::TwoSided,
            window: WindowType::Rectangular,
            ..Default::default()
        });
        let spectrum = analyzer.power_spectrum(&signal).unwrap();
        assert_eq!(spectrum.len(), 100);
        assert!((peak_frequency(&spectrum) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_lengths() {
        let analyzer = SpectrumAnalyzer::default();
        let empty = Signal::from_real(&[], 1000.0).unwrap();
        assert!(analyzer.power_spectrum(&empty).is_err());

        let analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
            resolution: Some(0),
            ..Default::default()
        });
        assert!(matches!(
            analyzer.power_spectrum(&sine(10.0, 1.0, 100, 1000.0)),
            Err(SpectrumError::InvalidLength { what: "resolution", .. })
        ));
    }

    #[test]
    fn test_config_serde() {
        let config = AnalyzerConfig {
            window: WindowType::Blackman,
            scaling: PowerScaling::Density,
            resolution: Some(4096),
            weighting: BandWeighting::Fractional,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        // Missing fields fall back to defaults
        let partial: AnalyzerConfig = serde_json::from_str(r#"{"window": "hamming"}"#).unwrap();
        assert_eq!(partial.window, WindowType::Hamming);
        assert_eq!(partial.scaling, PowerScaling::PerSample);
        assert!(partial.apply_correction);
    }

    #[test]
    fn test_update_config() {
        let mut analyzer = SpectrumAnalyzer::default();
        let config = AnalyzerConfig {
            reference: 20e-6,
            ..Default::default()
        };
        analyzer.update_config(config.clone());
        assert_eq!(analyzer.config(), &config);
    }
}
