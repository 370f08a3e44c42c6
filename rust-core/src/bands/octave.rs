//! Fractional-octave band definitions
//!
//! Band `i` of a series has its exact center at `1000 · G^(i/b)` Hz and edges
//! at `1000 · G^((2i ± 1)/(2b))`, where `b` is the fraction (3 for third
//! octaves) and `G` the octave ratio. Edges of neighbouring bands are
//! computed from the same exponent so they meet exactly.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectrumError};

/// Reference frequency of band index 0
const REFERENCE_FREQUENCY: f64 = 1000.0;

/// Nominal third-octave center frequencies (IEC 61260), 25 Hz to 20 kHz
pub const NOMINAL_THIRD_OCTAVE_CENTERS: [f64; 30] = [
    25.0, 31.5, 40.0, 50.0, 63.0, 80.0, 100.0, 125.0, 160.0, 200.0, 250.0, 315.0, 400.0, 500.0,
    630.0, 800.0, 1000.0, 1250.0, 1600.0, 2000.0, 2500.0, 3150.0, 4000.0, 5000.0, 6300.0, 8000.0,
    10000.0, 12500.0, 16000.0, 20000.0,
];

/// Octave frequency ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OctaveBase {
    /// G = 2
    #[default]
    Base2,

    /// G = 10^(3/10), the base-ten octave
    Base10,
}

impl OctaveBase {
    pub fn ratio(&self) -> f64 {
        match self {
            OctaveBase::Base2 => 2.0,
            OctaveBase::Base10 => 10f64.powf(0.3),
        }
    }
}

/// One fractional-octave band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctaveBand {
    center: f64,
    fraction: u32,
    base: OctaveBase,
    lower: f64,
    upper: f64,
}

impl OctaveBand {
    /// Band of `1/fraction` octave around `center` Hz, base 2
    pub fn new(center: f64, fraction: u32) -> Result<Self> {
        Self::with_base(center, fraction, OctaveBase::Base2)
    }

    pub fn with_base(center: f64, fraction: u32, base: OctaveBase) -> Result<Self> {
        if !(center.is_finite() && center > 0.0) {
            return Err(SpectrumError::InvalidBand(format!(
                "center frequency {} Hz must be finite and > 0",
                center
            )));
        }
        check_fraction(fraction)?;

        let half_width = base.ratio().powf(1.0 / (2.0 * fraction as f64));
        Ok(Self {
            center,
            fraction,
            base,
            lower: center / half_width,
            upper: center * half_width,
        })
    }

    /// Band `index` of the series anchored at 1 kHz
    pub fn from_index(index: i32, fraction: u32, base: OctaveBase) -> Result<Self> {
        check_fraction(fraction)?;
        let g = base.ratio();
        let b = fraction as f64;
        let i = index as f64;

        Ok(Self {
            center: REFERENCE_FREQUENCY * g.powf(i / b),
            fraction,
            base,
            lower: REFERENCE_FREQUENCY * g.powf((2.0 * i - 1.0) / (2.0 * b)),
            upper: REFERENCE_FREQUENCY * g.powf((2.0 * i + 1.0) / (2.0 * b)),
        })
    }

    /// Consecutive bands from the one containing `first_hz` through the one
    /// containing `last_hz`
    pub fn series(first_hz: f64, last_hz: f64, fraction: u32, base: OctaveBase) -> Result<Vec<Self>> {
        check_fraction(fraction)?;
        if !(first_hz.is_finite() && last_hz.is_finite() && first_hz > 0.0 && first_hz <= last_hz)
        {
            return Err(SpectrumError::InvalidBand(format!(
                "band range [{}, {}] Hz is invalid",
                first_hz, last_hz
            )));
        }

        let first = band_index(first_hz, fraction, base);
        let last = band_index(last_hz, fraction, base);
        (first..=last)
            .map(|i| Self::from_index(i, fraction, base))
            .collect()
    }

    /// Third-octave bands (base ten) whose nominal centers run from 25 Hz to
    /// 20 kHz
    pub fn nominal_third_octaves() -> Vec<Self> {
        let first = band_index(NOMINAL_THIRD_OCTAVE_CENTERS[0], 3, OctaveBase::Base10);
        (0..NOMINAL_THIRD_OCTAVE_CENTERS.len() as i32)
            .filter_map(|offset| Self::from_index(first + offset, 3, OctaveBase::Base10).ok())
            .collect()
    }

    /// Exact center frequency in Hz
    pub fn center(&self) -> f64 {
        self.center
    }

    /// Octave division (1 = octave, 3 = third octave)
    pub fn fraction(&self) -> u32 {
        self.fraction
    }

    pub fn base(&self) -> OctaveBase {
        self.base
    }

    /// Lower edge in Hz (inclusive)
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper edge in Hz (exclusive)
    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn contains(&self, freq: f64) -> bool {
        self.lower <= freq && freq < self.upper
    }
}

/// Index of the band whose half-open range contains `freq`
fn band_index(freq: f64, fraction: u32, base: OctaveBase) -> i32 {
    let position = fraction as f64 * (freq / REFERENCE_FREQUENCY).ln() / base.ratio().ln();
    (position + 0.5).floor() as i32
}

fn check_fraction(fraction: u32) -> Result<()> {
    if fraction == 0 {
        return Err(SpectrumError::InvalidBand(
            "octave fraction must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        let octave = OctaveBand::new(1000.0, 1).unwrap();
        assert!((octave.lower() - 707.1067811865476).abs() < 1e-9);
        assert!((octave.upper() - 1414.213562373095).abs() < 1e-9);

        let third = OctaveBand::new(1000.0, 3).unwrap();
        assert!((third.lower() - 890.8987181403393).abs() < 1e-9);
        assert!((third.upper() - 1122.4620483093731).abs() < 1e-9);
        assert!(third.contains(1000.0));
        assert!(!third.contains(third.upper()));
        assert!(third.contains(third.lower()));
    }

    #[test]
    fn test_invalid_bands() {
        assert!(matches!(
            OctaveBand::new(0.0, 3),
            Err(SpectrumError::InvalidBand(_))
        ));
        assert!(OctaveBand::new(f64::NAN, 3).is_err());
        assert!(OctaveBand::new(1000.0, 0).is_err());
        assert!(OctaveBand::series(500.0, 100.0, 3, OctaveBase::Base2).is_err());
        assert!(OctaveBand::series(-1.0, 100.0, 3, OctaveBase::Base2).is_err());
    }

    #[test]
    fn test_octave_series() {
        let bands = OctaveBand::series(125.0, 4000.0, 1, OctaveBase::Base2).unwrap();
        let centers: Vec<f64> = bands.iter().map(|b| b.center()).collect();

        assert_eq!(centers.len(), 6);
        for (got, expected) in centers.iter().zip([125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0]) {
            assert!((got - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_series_edges_meet() {
        let bands = OctaveBand::series(100.0, 10000.0, 3, OctaveBase::Base10).unwrap();
        for pair in bands.windows(2) {
            assert_eq!(pair[0].upper(), pair[1].lower());
        }
    }

    #[test]
    fn test_series_contains_endpoints() {
        let bands = OctaveBand::series(95.0, 1300.0, 3, OctaveBase::Base2).unwrap();
        assert!(bands.first().unwrap().contains(95.0));
        assert!(bands.last().unwrap().contains(1300.0));
    }

    #[test]
    fn test_nominal_third_octaves() {
        let bands = OctaveBand::nominal_third_octaves();
        assert_eq!(bands.len(), NOMINAL_THIRD_OCTAVE_CENTERS.len());

        for (band, nominal) in bands.iter().zip(NOMINAL_THIRD_OCTAVE_CENTERS) {
            assert_eq!(band.fraction(), 3);
            assert_eq!(band.base(), OctaveBase::Base10);
            assert!((band.center() - nominal).abs() / nominal < 0.02);
        }
    }
}
