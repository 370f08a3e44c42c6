//! Fractional-octave band definitions and aggregation

pub mod aggregate;
pub mod octave;

pub use aggregate::{aggregate, aggregate_bins, BandLevel, BandPartition, BandPower, BandWeighting, BinSpan};
pub use octave::{OctaveBand, OctaveBase, NOMINAL_THIRD_OCTAVE_CENTERS};
