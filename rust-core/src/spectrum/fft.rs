//! FFT primitives used by the chirp-z engine and the analyzer
//!
//! `FftPrimitive` is the seam the Bluestein convolution runs on. `RustFft` is
//! the default implementation; `RealFftEngine` is the real-input fast path
//! for power-of-two buffers.

use std::sync::Arc;

use num_complex::Complex64;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::error::{Result, SpectrumError};

/// Forward/inverse complex DFT of a fixed length
///
/// `inverse` is normalized so that `inverse(forward(x)) == x`.
pub trait FftPrimitive: Send + Sync {
    /// Transform length the primitive was planned for
    fn len(&self) -> usize;

    /// In-place forward transform, `buffer.len() == self.len()`
    fn forward(&self, buffer: &mut [Complex64]);

    /// In-place inverse transform scaled by `1/len`
    fn inverse(&self, buffer: &mut [Complex64]);
}

/// Complex FFT pair backed by rustfft
#[derive(Clone)]
pub struct RustFft {
    len: usize,
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
}

impl RustFft {
    /// Plan forward and inverse transforms of `len` points
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        let ifft = planner.plan_fft_inverse(len);

        Self { len, fft, ifft }
    }
}

impl FftPrimitive for RustFft {
    fn len(&self) -> usize {
        self.len
    }

    fn forward(&self, buffer: &mut [Complex64]) {
        self.fft.process(buffer);
    }

    fn inverse(&self, buffer: &mut [Complex64]) {
        self.ifft.process(buffer);

        // rustfft leaves the inverse unnormalized
        let scale = 1.0 / self.len as f64;
        for c in buffer.iter_mut() {
            *c *= scale;
        }
    }
}

impl std::fmt::Debug for RustFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustFft").field("len", &self.len).finish()
    }
}

/// Real-to-complex FFT engine
///
/// Planned once per size. Scratch buffers are allocated per call so one
/// engine can serve several threads.
pub struct RealFftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,
}

impl RealFftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Result<Self> {
        if fft_size == 0 {
            return Err(SpectrumError::InvalidLength {
                what: "fft size",
                len: 0,
            });
        }

        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        Ok(Self { fft_size, r2c })
    }

    /// Compute the half spectrum X[k] for k = 0..fft_size/2
    ///
    /// # Arguments
    /// * `signal` - Input signal (zero-padded or truncated to fft_size)
    pub fn half_spectrum(&self, signal: &[f64]) -> Result<Vec<Complex64>> {
        let mut input = self.r2c.make_input_vec();
        let mut output = self.r2c.make_output_vec();

        let copy_len = signal.len().min(self.fft_size);
        input[..copy_len].copy_from_slice(&signal[..copy_len]);

        self.r2c
            .process(&mut input, &mut output)
            .map_err(|_| SpectrumError::LengthMismatch {
                expected: self.fft_size,
                actual: signal.len(),
            })?;

        Ok(output)
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Frequency of each half-spectrum bin in Hz
    pub fn frequency_axis(&self, sample_rate: f64) -> Vec<f64> {
        (0..self.num_bins())
            .map(|bin| bin as f64 * sample_rate / self.fft_size as f64)
            .collect()
    }
}
