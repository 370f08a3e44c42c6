//! Chirp z-transform via Bluestein's algorithm
//!
//! Evaluates the z-transform of an `n`-sample sequence at `m` points along
//! the contour `z_k = a·w^-k`:
//!
//! ```text
//! X[k] = Σ x[j] · a^-j · w^(j·k),   k = 0..m-1
//! ```
//!
//! Substituting `j·k = (j² + k² - (k-j)²) / 2` turns the sum into a
//! convolution with the inverse chirp `w^(-t²/2)`, which is computed with
//! FFTs of the next power of two `≥ m + n - 1`. With `m = n`,
//! `w = exp(-2πi/n)` and `a = 1` the result is the DFT, for any `n`.

use std::f64::consts::TAU;

use num_complex::Complex64;
use tracing::debug;

use super::fft::{FftPrimitive, RustFft};
use crate::error::{Result, SpectrumError};
use crate::signal::Signal;

/// Tolerance used to recognise unit-circle and root-of-unity contours
const CONTOUR_TOLERANCE: f64 = 1e-9;

/// Evaluation contour `a·w^-k`, k = 0..m-1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourSpec {
    /// Number of output points
    pub m: usize,

    /// Ratio between successive points
    pub w: Complex64,

    /// Starting point
    pub a: Complex64,
}

impl ContourSpec {
    /// Contour of `m` points starting at `a` with ratio `w`
    pub fn new(m: usize, w: Complex64, a: Complex64) -> Self {
        Self { m, w, a }
    }

    /// Standard DFT contour: `m` equally spaced points on the unit circle
    /// starting at z = 1
    pub fn dft(m: usize) -> Self {
        Self {
            m,
            w: Complex64::from_polar(1.0, -TAU / m as f64),
            a: Complex64::new(1.0, 0.0),
        }
    }

    /// Zoom contour covering `[f_start, f_end)` Hz with `m` points on the
    /// unit circle
    pub fn zoom(f_start: f64, f_end: f64, m: usize, sample_rate: f64) -> Result<Self> {
        crate::signal::validate_sample_rate(sample_rate)?;
        if m == 0 {
            return Err(SpectrumError::InvalidLength {
                what: "contour points",
                len: m,
            });
        }
        if !(f_start.is_finite() && f_end.is_finite()) || f_end <= f_start {
            return Err(SpectrumError::DegenerateContour(format!(
                "zoom range [{}, {}) Hz is empty",
                f_start, f_end
            )));
        }

        let theta_start = TAU * f_start / sample_rate;
        let d_theta = TAU * (f_end - f_start) / (sample_rate * m as f64);

        Ok(Self {
            m,
            w: Complex64::from_polar(1.0, -d_theta),
            a: Complex64::from_polar(1.0, theta_start),
        })
    }

    /// True when this is the `m`-point DFT contour
    pub fn is_dft(&self) -> bool {
        let reference = Self::dft(self.m);
        (self.a - reference.a).norm() < CONTOUR_TOLERANCE
            && (self.w - reference.w).norm() < CONTOUR_TOLERANCE
    }

    /// Contour point `a·w^-k`
    pub fn point(&self, k: usize) -> Complex64 {
        self.a * self.w.powf(-(k as f64))
    }

    /// Check the contour against an `n`-sample input
    pub fn validate(&self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(SpectrumError::InvalidLength {
                what: "input length",
                len: n,
            });
        }
        if self.m == 0 {
            return Err(SpectrumError::InvalidLength {
                what: "contour points",
                len: self.m,
            });
        }
        if !is_finite(self.w) || self.w.norm_sqr() == 0.0 {
            return Err(SpectrumError::DegenerateContour(format!(
                "w = {} cannot be inverted",
                self.w
            )));
        }
        if !is_finite(self.a) {
            return Err(SpectrumError::DegenerateContour(format!(
                "a = {} is not finite",
                self.a
            )));
        }
        // a^-k is only needed for k > 0
        if n > 1 && self.a.norm_sqr() == 0.0 {
            return Err(SpectrumError::DegenerateContour(
                "a = 0 with more than one input sample".to_string(),
            ));
        }
        Ok(())
    }
}

/// Chirp sequence `w^(k²/2)` for k = 1-n ..= max(m,n)-1
///
/// Element `i` holds `k = i - (n - 1)`.
#[derive(Debug, Clone)]
pub struct ChirpTable {
    chirp: Vec<Complex64>,
    fft_len: usize,
}

impl ChirpTable {
    pub fn new(n: usize, m: usize, w: Complex64) -> Result<Self> {
        ContourSpec::new(m, w, Complex64::new(1.0, 0.0)).validate(n)?;

        // The chirp is even in k, so compute the non-negative half once
        let half_len = m.max(n);
        let half: Vec<Complex64> = (0..half_len)
            .map(|k| w.powf((k * k) as f64 / 2.0))
            .collect();

        let mut chirp = Vec::with_capacity(half_len + n - 1);
        chirp.extend(half[1..n].iter().rev());
        chirp.extend_from_slice(&half);

        // Only the first m + n - 1 entries are inverted
        if let Some(bad) = chirp[..m + n - 1]
            .iter()
            .find(|c| c.norm_sqr() == 0.0 || !is_finite(**c))
        {
            return Err(SpectrumError::DegenerateContour(format!(
                "chirp value {} cannot be inverted (|w| = {})",
                bad,
                w.norm()
            )));
        }

        Ok(Self {
            chirp,
            fft_len: (m + n - 1).next_power_of_two(),
        })
    }

    /// Chirp `w^(k²/2)` for k = 1-n..max(m, n)-1
    pub fn chirp(&self) -> &[Complex64] {
        &self.chirp
    }

    /// Convolution length: smallest power of two `≥ m + n - 1`
    pub fn fft_len(&self) -> usize {
        self.fft_len
    }

    /// Number of chirp entries
    pub fn len(&self) -> usize {
        self.chirp.len()
    }

    /// True when the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.chirp.is_empty()
    }
}

/// Precomputed Bluestein plan for one `(n, contour)` pair
///
/// The plan is immutable, so it can be shared between threads; each call to
/// [`ChirpZ::process`] allocates its own working buffer.
pub struct ChirpZ<F: FftPrimitive = RustFft> {
    n: usize,
    contour: ContourSpec,
    table: ChirpTable,

    /// `a^-k · w^(k²/2)` for k = 0..n-1
    input_weights: Vec<Complex64>,

    /// FFT of the zero-padded inverse chirp
    ichirp_fft: Vec<Complex64>,

    fft: F,
}

impl ChirpZ<RustFft> {
    /// Plan a transform of `n` samples along `contour`
    pub fn new(n: usize, contour: ContourSpec) -> Result<Self> {
        contour.validate(n)?;
        let fft_len = (contour.m + n - 1).next_power_of_two();
        Self::with_fft(n, contour, RustFft::new(fft_len))
    }
}

impl<F: FftPrimitive> ChirpZ<F> {
    /// Plan a transform on a caller-supplied FFT primitive
    ///
    /// The primitive must be planned for `(m + n - 1).next_power_of_two()`
    /// points.
    pub fn with_fft(n: usize, contour: ContourSpec, fft: F) -> Result<Self> {
        contour.validate(n)?;
        let m = contour.m;
        let table = ChirpTable::new(n, m, contour.w)?;
        let fft_len = table.fft_len();

        if fft.len() != fft_len {
            return Err(SpectrumError::LengthMismatch {
                expected: fft_len,
                actual: fft.len(),
            });
        }

        let chirp = table.chirp();

        let input_weights: Vec<Complex64> = if n == 1 {
            vec![chirp[0]]
        } else {
            let a_inv = contour.a.inv();
            (0..n)
                .map(|k| a_inv.powu(k as u32) * chirp[n - 1 + k])
                .collect()
        };

        let mut ichirp_fft = vec![Complex64::new(0.0, 0.0); fft_len];
        for (dst, c) in ichirp_fft.iter_mut().zip(&chirp[..m + n - 1]) {
            *dst = c.inv();
        }
        fft.forward(&mut ichirp_fft);

        debug!(n, m, fft_len, "planned chirp-z transform");

        Ok(Self {
            n,
            contour,
            table,
            input_weights,
            ichirp_fft,
            fft,
        })
    }

    /// Evaluate the transform of `x` (length must equal the planned `n`)
    pub fn process(&self, x: &[Complex64]) -> Result<Vec<Complex64>> {
        if x.len() != self.n {
            return Err(SpectrumError::LengthMismatch {
                expected: self.n,
                actual: x.len(),
            });
        }

        let n = self.n;
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.table.fft_len()];
        for ((dst, &s), &weight) in buffer.iter_mut().zip(x).zip(&self.input_weights) {
            *dst = s * weight;
        }

        self.fft.forward(&mut buffer);
        for (b, h) in buffer.iter_mut().zip(&self.ichirp_fft) {
            *b *= h;
        }
        self.fft.inverse(&mut buffer);

        let chirp = self.table.chirp();
        Ok((0..self.contour.m)
            .map(|k| buffer[n - 1 + k] * chirp[n - 1 + k])
            .collect())
    }

    /// Planned input length `n`
    pub fn input_len(&self) -> usize {
        self.n
    }

    /// Contour the plan evaluates
    pub fn contour(&self) -> &ContourSpec {
        &self.contour
    }

    /// Convolution FFT length
    pub fn fft_len(&self) -> usize {
        self.table.fft_len()
    }
}

/// Transform output with the context needed to interpret it
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumResult {
    bins: Vec<Complex64>,
    contour: ContourSpec,
    input_len: usize,
    real_input: bool,
    sample_rate: f64,
}

impl SpectrumResult {
    pub(crate) fn new(
        bins: Vec<Complex64>,
        contour: ContourSpec,
        input_len: usize,
        real_input: bool,
        sample_rate: f64,
    ) -> Self {
        Self {
            bins,
            contour,
            input_len,
            real_input,
            sample_rate,
        }
    }

    /// Value at contour point `a·w^-k` for each k
    pub fn bins(&self) -> &[Complex64] {
        &self.bins
    }

    /// Take ownership of the bin values
    pub fn into_bins(self) -> Vec<Complex64> {
        self.bins
    }

    /// Contour the bins were evaluated on
    pub fn contour(&self) -> &ContourSpec {
        &self.contour
    }

    /// Length `n` of the transformed signal
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// True when the transformed signal was real
    pub fn is_real_input(&self) -> bool {
        self.real_input
    }

    /// Sample rate in Hz of the transformed signal
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of bins (`m`)
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// True when no bins were evaluated
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Frequency in Hz of every contour point
    ///
    /// The angle is unwrapped: a DFT contour yields `0, fs/m, 2·fs/m, …`.
    pub fn frequencies(&self) -> Vec<f64> {
        let start = self.contour.a.arg();
        let step = -self.contour.w.arg();
        (0..self.bins.len())
            .map(|k| self.sample_rate * (start + k as f64 * step) / TAU)
            .collect()
    }
}

/// Chirp-z transform of a raw complex sequence
pub fn czt(x: &[Complex64], contour: &ContourSpec) -> Result<Vec<Complex64>> {
    ChirpZ::new(x.len(), *contour)?.process(x)
}

/// Evaluate the z-transform of `signal` along `contour`
pub fn evaluate(signal: &Signal, contour: &ContourSpec) -> Result<SpectrumResult> {
    let bins = czt(signal.samples(), contour)?;
    Ok(SpectrumResult::new(
        bins,
        *contour,
        signal.len(),
        signal.is_real(),
        signal.sample_rate(),
    ))
}

/// DFT of any length, evaluated with the default contour
pub fn dft(signal: &Signal) -> Result<SpectrumResult> {
    evaluate(signal, &ContourSpec::dft(signal.len()))
}

/// Recover the time-domain sequence from a spectrum
///
/// Requires `m = n` and `w` a primitive `n`-th root of unity, which makes
/// the contour a rotated DFT. The inverse is evaluated as a second chirp-z
/// transform with step `1/w`.
pub fn invert(spectrum: &SpectrumResult) -> Result<Vec<Complex64>> {
    let n = spectrum.input_len();
    let contour = spectrum.contour();

    if contour.m != n {
        return Err(SpectrumError::NonInvertibleContour(format!(
            "{} points cannot determine {} samples",
            contour.m, n
        )));
    }
    if (contour.w.norm() - 1.0).abs() > CONTOUR_TOLERANCE {
        return Err(SpectrumError::NonInvertibleContour(format!(
            "|w| = {} is off the unit circle",
            contour.w.norm()
        )));
    }

    // w must be exp(-2πi·p/n) with gcd(p, n) = 1
    let turns = -contour.w.arg() * n as f64 / TAU;
    let p = (turns.round() as i64).rem_euclid(n as i64) as usize;
    let root = Complex64::from_polar(1.0, -TAU * p as f64 / n as f64);
    if (contour.w - root).norm() > CONTOUR_TOLERANCE || gcd(p, n) != 1 {
        return Err(SpectrumError::NonInvertibleContour(format!(
            "w = {} is not a primitive {}-th root of unity",
            contour.w, n
        )));
    }

    let inverse_contour = ContourSpec::new(n, contour.w.inv(), Complex64::new(1.0, 0.0));
    let y = czt(spectrum.bins(), &inverse_contour)?;

    let scale = 1.0 / n as f64;
    Ok(y.iter()
        .enumerate()
        .map(|(j, &v)| v * contour.a.powu(j as u32) * scale)
        .collect())
}

fn is_finite(c: Complex64) -> bool {
    c.re.is_finite() && c.im.is_finite()
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
