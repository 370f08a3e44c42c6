//! Sampled input signal
//!
//! Real and complex buffers share one representation. The realness flag is
//! kept so the power stage knows whether folding to one side is valid.

use num_complex::Complex64;

use crate::error::{Result, SpectrumError};

/// Immutable block of samples paired with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<Complex64>,
    sample_rate: f64,
    real: bool,
}

impl Signal {
    /// Build a signal from real samples
    ///
    /// # Arguments
    /// * `samples` - Time-domain samples
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_real(samples: &[f64], sample_rate: f64) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        Ok(Self {
            samples: samples.iter().map(|&s| Complex64::new(s, 0.0)).collect(),
            sample_rate,
            real: true,
        })
    }

    /// Build a signal from complex (e.g. I/Q) samples
    pub fn from_complex(samples: Vec<Complex64>, sample_rate: f64) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        Ok(Self {
            samples,
            sample_rate,
            real: false,
        })
    }

    /// Samples as complex values
    pub fn samples(&self) -> &[Complex64] {
        &self.samples
    }

    /// Real parts of the samples
    pub fn real_samples(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.re).collect()
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// True when the signal was built from real samples
    pub fn is_real(&self) -> bool {
        self.real
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the signal holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sum of squared magnitudes
    pub fn energy(&self) -> f64 {
        self.samples.iter().map(|s| s.norm_sqr()).sum()
    }

    /// Copy of this signal with every sample multiplied by `gains[k]`
    pub(crate) fn scaled(&self, gains: &[f64]) -> Self {
        Self {
            samples: self
                .samples
                .iter()
                .zip(gains.iter())
                .map(|(&s, &g)| s * g)
                .collect(),
            sample_rate: self.sample_rate,
            real: self.real,
        }
    }
}

pub(crate) fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(SpectrumError::InvalidSampleRate(sample_rate))
    }
}
