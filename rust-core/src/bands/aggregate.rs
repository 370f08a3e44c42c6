//! Band aggregation of a power spectrum
//!
//! Bins are assigned to bands once per frequency axis by [`BandPartition`];
//! the assignment never looks at power values, so repeated calls on the same
//! axis always sum the same bins.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::octave::OctaveBand;
use crate::error::{Result, SpectrumError};
use crate::signal::validate_sample_rate;
use crate::spectrum::power::{level_db, validate_reference, PowerSpectrum};

/// Steepness constant of the fractional band-filter approximation
const FRACTIONAL_FILTER_SHAPE: f64 = 1.507;

/// How bin energy is attributed to a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandWeighting {
    /// Sum of bins with `lower ≤ f < upper`
    #[default]
    Rectangular,

    /// Every positive-frequency bin weighted by a sixth-order band-filter
    /// magnitude response centred on the band
    Fractional,
}

/// Bins assigned to one band
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinSpan {
    /// Contiguous bins inside the band edges
    Bins(Range<usize>),

    /// No bin falls inside the band (band narrower than the resolution)
    Unmeasurable,

    /// A band edge lies outside `[0, fs/2]`
    OutOfRange,
}

/// Level reported for one band
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandLevel {
    /// Level in dB; `-∞` for a silent band
    Measured(f64),

    /// No spectrum bin inside the band
    Unmeasurable,

    /// Band extends beyond the Nyquist range
    OutOfRange,
}

impl BandLevel {
    /// Measured level, if any
    pub fn db(&self) -> Option<f64> {
        match self {
            BandLevel::Measured(db) => Some(*db),
            _ => None,
        }
    }
}

/// Band together with its level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPower {
    pub band: OctaveBand,
    pub level: BandLevel,
}

/// Assignment of frequency bins to bands
#[derive(Debug, Clone, PartialEq)]
pub struct BandPartition {
    bands: Vec<OctaveBand>,
    spans: Vec<BinSpan>,
    frequencies: Vec<f64>,
}

impl BandPartition {
    /// Partition `freqs` among `bands`
    ///
    /// # Arguments
    /// * `freqs` - Bin frequencies in Hz, finite and non-decreasing
    /// * `bands` - Bands in output order
    /// * `sample_rate` - Sample rate in Hz, sets the Nyquist limit
    pub fn new(freqs: &[f64], bands: &[OctaveBand], sample_rate: f64) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        if let Some(bad) = freqs.iter().find(|f| !f.is_finite()) {
            return Err(SpectrumError::InvalidFrequencyAxis(format!(
                "frequency {} is not finite",
                bad
            )));
        }
        if let Some(i) = freqs.windows(2).position(|pair| pair[1] < pair[0]) {
            return Err(SpectrumError::InvalidFrequencyAxis(format!(
                "frequencies decrease at bin {} ({} > {})",
                i + 1,
                freqs[i],
                freqs[i + 1]
            )));
        }

        let nyquist = sample_rate / 2.0;
        let spans = bands
            .iter()
            .map(|band| {
                if band.lower() < 0.0 || band.upper() > nyquist {
                    trace!(center = band.center(), nyquist, "band outside Nyquist range");
                    return BinSpan::OutOfRange;
                }

                let start = freqs.partition_point(|&f| f < band.lower());
                let end = freqs.partition_point(|&f| f < band.upper());
                if start == end {
                    trace!(center = band.center(), "no bins inside band");
                    BinSpan::Unmeasurable
                } else {
                    BinSpan::Bins(start..end)
                }
            })
            .collect();

        Ok(Self {
            bands: bands.to_vec(),
            spans,
            frequencies: freqs.to_vec(),
        })
    }

    /// Bands in output order
    pub fn bands(&self) -> &[OctaveBand] {
        &self.bands
    }

    /// Bin assignment of each band, in band order
    pub fn spans(&self) -> &[BinSpan] {
        &self.spans
    }

    /// Length of the partitioned frequency axis
    pub fn num_bins(&self) -> usize {
        self.frequencies.len()
    }

    /// Band levels in dB re `reference²`
    ///
    /// # Arguments
    /// * `power` - Power per bin, same length as the partitioned axis
    /// * `reference` - Reference amplitude (e.g. 20 µPa)
    /// * `weighting` - Bin attribution rule
    pub fn aggregate(
        &self,
        power: &[f64],
        reference: f64,
        weighting: BandWeighting,
    ) -> Result<Vec<BandPower>> {
        validate_reference(reference)?;
        if power.len() != self.frequencies.len() {
            return Err(SpectrumError::LengthMismatch {
                expected: self.frequencies.len(),
                actual: power.len(),
            });
        }

        Ok(self
            .bands
            .iter()
            .zip(&self.spans)
            .map(|(band, span)| {
                let level = match span {
                    BinSpan::OutOfRange => BandLevel::OutOfRange,
                    BinSpan::Unmeasurable => BandLevel::Unmeasurable,
                    BinSpan::Bins(range) => {
                        let energy = match weighting {
                            BandWeighting::Rectangular => power[range.clone()].iter().sum(),
                            BandWeighting::Fractional => self.weighted_energy(band, power),
                        };
                        BandLevel::Measured(level_db(energy, reference))
                    }
                };
                BandPower { band: *band, level }
            })
            .collect())
    }

    fn weighted_energy(&self, band: &OctaveBand, power: &[f64]) -> f64 {
        let fc = band.center();
        let shape = FRACTIONAL_FILTER_SHAPE * band.fraction() as f64;
        self.frequencies
            .iter()
            .zip(power)
            .filter(|(&f, _)| f > 0.0)
            .map(|(&f, &p)| {
                let detune = (f / fc - fc / f) * shape;
                p / (1.0 + detune.powi(6))
            })
            .sum()
    }
}

/// Rectangular band levels of a power spectrum
pub fn aggregate(
    power: &PowerSpectrum,
    bands: &[OctaveBand],
    reference: f64,
) -> Result<Vec<BandPower>> {
    BandPartition::new(power.frequencies(), bands, power.sample_rate())?.aggregate(
        power.power(),
        reference,
        BandWeighting::Rectangular,
    )
}

/// Rectangular band levels from raw power and frequency slices
pub fn aggregate_bins(
    power: &[f64],
    freqs: &[f64],
    bands: &[OctaveBand],
    sample_rate: f64,
    reference: f64,
) -> Result<Vec<BandPower>> {
    BandPartition::new(freqs, bands, sample_rate)?.aggregate(
        power,
        reference,
        BandWeighting::Rectangular,
    )
}
