//! Power and power-spectral-density spectra
//!
//! The normalization is always chosen by the caller through
//! [`PowerScaling`]; no convention is applied implicitly.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::czt::SpectrumResult;
use crate::error::{Result, SpectrumError};

/// Normalization applied to `|X[k]|²`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerScaling {
    /// `|X[k]|²`
    Raw,

    /// `|X[k]|² / n`
    #[default]
    PerSample,

    /// `|X[k]|² / n²` (mean-square amplitude per bin)
    PerSampleSquared,

    /// `|X[k]|² / (n·fs)`, power per Hz
    Density,
}

impl PowerScaling {
    /// Multiplier applied to every squared magnitude
    pub fn factor(&self, n: usize, sample_rate: f64) -> f64 {
        let n = n as f64;
        match self {
            PowerScaling::Raw => 1.0,
            PowerScaling::PerSample => 1.0 / n,
            PowerScaling::PerSampleSquared => 1.0 / (n * n),
            PowerScaling::Density => 1.0 / (n * sample_rate),
        }
    }
}

/// Which half of the spectrum is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sidedness {
    /// Bins 0..=m/2 with the mirrored energy folded in (real input only)
    #[default]
    OneSided,

    /// All m bins
    TwoSided,
}

/// Non-negative power per bin with its frequency axis
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    power: Vec<f64>,
    frequencies: Vec<f64>,
    sample_rate: f64,
    scaling: PowerScaling,
    sidedness: Sidedness,
}

impl PowerSpectrum {
    /// Power per bin
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Frequency of each bin in Hz
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Sample rate in Hz of the analysed signal
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Normalization applied to the squared magnitudes
    pub fn scaling(&self) -> PowerScaling {
        self.scaling
    }

    /// Whether mirrored energy is folded into the positive half
    pub fn sidedness(&self) -> Sidedness {
        self.sidedness
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.power.len()
    }

    /// True when the spectrum holds no bins
    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Sum of power over all bins
    pub fn total_power(&self) -> f64 {
        self.power.iter().sum()
    }

    /// Level of each bin in dB re `reference²`
    pub fn to_decibels(&self, reference: f64) -> Result<Vec<f64>> {
        validate_reference(reference)?;
        Ok(self
            .power
            .iter()
            .map(|&p| level_db(p, reference))
            .collect())
    }

    /// Multiply every bin by `gain` (window energy correction)
    pub(crate) fn scaled(mut self, gain: f64) -> Self {
        for p in self.power.iter_mut() {
            *p *= gain;
        }
        self
    }

    /// One-sided spectrum from the half spectrum of an `m`-point real DFT
    ///
    /// `half` holds at least bins 0..=m/2.
    pub(crate) fn from_half_spectrum(
        half: &[Complex64],
        m: usize,
        n: usize,
        scaling: PowerScaling,
        sample_rate: f64,
    ) -> Result<Self> {
        check_length(n)?;
        let factor = scaling.factor(n, sample_rate);
        let squared: Vec<f64> = half[..m / 2 + 1]
            .iter()
            .map(|c| c.norm_sqr() * factor)
            .collect();

        Ok(Self {
            power: fold_one_sided(squared, m),
            frequencies: (0..=m / 2)
                .map(|k| k as f64 * sample_rate / m as f64)
                .collect(),
            sample_rate,
            scaling,
            sidedness: Sidedness::OneSided,
        })
    }
}

/// Convert a transform output to a power spectrum
///
/// # Arguments
/// * `spectrum` - Chirp-z or DFT output
/// * `n` - Signal length used for normalization
/// * `scaling` - Normalization of the squared magnitudes
/// * `sidedness` - One-sided output requires real input on a DFT contour
pub fn to_power_spectrum(
    spectrum: &SpectrumResult,
    n: usize,
    scaling: PowerScaling,
    sidedness: Sidedness,
) -> Result<PowerSpectrum> {
    check_length(n)?;
    let sample_rate = spectrum.sample_rate();

    match sidedness {
        Sidedness::TwoSided => {
            let factor = scaling.factor(n, sample_rate);
            Ok(PowerSpectrum {
                power: spectrum
                    .bins()
                    .iter()
                    .map(|c| c.norm_sqr() * factor)
                    .collect(),
                frequencies: spectrum.frequencies(),
                sample_rate,
                scaling,
                sidedness,
            })
        }
        Sidedness::OneSided => {
            if !spectrum.is_real_input() {
                return Err(SpectrumError::OneSidedUnsupported(
                    "complex input has no mirror symmetry",
                ));
            }
            if !spectrum.contour().is_dft() {
                return Err(SpectrumError::OneSidedUnsupported(
                    "only a full DFT contour has a negative-frequency half",
                ));
            }
            PowerSpectrum::from_half_spectrum(
                spectrum.bins(),
                spectrum.len(),
                n,
                scaling,
                sample_rate,
            )
        }
    }
}

/// Double every bin except DC and, for even `m`, Nyquist
fn fold_one_sided(mut half: Vec<f64>, m: usize) -> Vec<f64> {
    let last = half.len() - 1;
    for (k, p) in half.iter_mut().enumerate() {
        let nyquist = m % 2 == 0 && k == last;
        if k != 0 && !nyquist {
            *p *= 2.0;
        }
    }
    half
}

/// Level in dB of `power` re `reference²`
///
/// Zero power maps to negative infinity.
pub fn to_decibels(power: f64, reference: f64) -> Result<f64> {
    validate_reference(reference)?;
    Ok(level_db(power, reference))
}

/// `10·log10(power / reference²)` for an already validated reference
pub(crate) fn level_db(power: f64, reference: f64) -> f64 {
    10.0 * (power / (reference * reference)).log10()
}

pub(crate) fn validate_reference(reference: f64) -> Result<()> {
    if reference.is_finite() && reference > 0.0 {
        Ok(())
    } else {
        Err(SpectrumError::InvalidReference(reference))
    }
}

fn check_length(n: usize) -> Result<()> {
    if n == 0 {
        return Err(SpectrumError::InvalidLength {
            what: "normalization length",
            len: n,
        });
    }
    Ok(())
}
