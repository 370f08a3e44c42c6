//! Window functions applied before the transform
//!
//! Windows reduce leakage at the cost of energy. The power correction factor
//! restores the level of broadband energy in the resulting power spectrum.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::signal::Signal;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Rectangular window (no windowing)
    Rectangular,

    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/(M-1))
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/(M-1))
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/(M-1)) + 0.08*cos(4πn/(M-1))
    Blackman,
}

/// Generate symmetric window coefficients w[n] for n = 0..length-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    // A single tap has no shape
    if length <= 1 || window_type == WindowType::Rectangular {
        return vec![1.0; length];
    }

    let span = (length - 1) as f64;
    (0..length)
        .map(|n| {
            let angle = 2.0 * PI * n as f64 / span;
            match window_type {
                WindowType::Hann => 0.5 - 0.5 * angle.cos(),
                WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
                WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
                WindowType::Rectangular => 1.0,
            }
        })
        .collect()
}

/// Apply window to every sample of `signal`
pub fn apply_window(signal: &Signal, window_type: WindowType) -> Signal {
    if window_type == WindowType::Rectangular {
        return signal.clone();
    }
    signal.scaled(&generate_window(window_type, signal.len()))
}

/// Mean window value (amplitude loss of a windowed tone)
pub fn coherent_gain(window_type: WindowType, length: usize) -> f64 {
    if length == 0 {
        return 1.0;
    }
    generate_window(window_type, length).iter().sum::<f64>() / length as f64
}

/// Calculate window power correction factor `M / Σw²`
///
/// Multiplying a windowed power spectrum by this factor restores the
/// energy of broadband input. For a long Hann window it tends to 1/0.375.
pub fn power_correction_factor(window_type: WindowType, length: usize) -> f64 {
    if length == 0 {
        return 1.0;
    }
    let sum_sq: f64 = generate_window(window_type, length)
        .iter()
        .map(|&w| w * w)
        .sum();
    length as f64 / sum_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_generation() {
        let length = 161;

        let hann = generate_window(WindowType::Hann, length);
        let hamming = generate_window(WindowType::Hamming, length);
        let blackman = generate_window(WindowType::Blackman, length);

        assert_eq!(hann.len(), length);

        // Symmetric, peak of 1.0 at the center
        let center = length / 2;
        for w in [&hann, &hamming, &blackman] {
            assert!((w[0] - w[length - 1]).abs() < 1e-10);
            assert!((w[center] - 1.0).abs() < 1e-10);
        }

        assert!(hann[0].abs() < 1e-12);
        assert!(hamming[0] > 0.07 && hamming[0] < 0.09);
    }

    #[test]
    fn test_short_windows() {
        assert!(generate_window(WindowType::Hann, 0).is_empty());
        assert_eq!(generate_window(WindowType::Hann, 1), vec![1.0]);
    }

    #[test]
    fn test_apply_window() {
        let signal = Signal::from_real(&[1.0; 101], 1000.0).unwrap();
        let windowed = apply_window(&signal, WindowType::Hamming);

        assert_eq!(windowed.len(), 101);
        assert!(windowed.is_real());
        assert!((windowed.samples()[50].re - 1.0).abs() < 1e-10);
        assert!(windowed.samples()[0].re < 0.1);
    }

    #[test]
    fn test_correction_factors() {
        assert!((power_correction_factor(WindowType::Rectangular, 100) - 1.0).abs() < 1e-12);
        assert!((coherent_gain(WindowType::Rectangular, 100) - 1.0).abs() < 1e-12);

        // Hann: mean 0.5, mean square 0.375
        let n = 100_000;
        assert!((coherent_gain(WindowType::Hann, n) - 0.5).abs() < 1e-4);
        assert!((power_correction_factor(WindowType::Hann, n) - 1.0 / 0.375).abs() < 1e-3);
    }
}
