//! Derived statistics over the chart catalog: averages, valence dispersion,
//! energy banding and the artist leaderboard.

mod engine;
mod stats;

pub use engine::{
    AggregationEngine, EnergyBandRow, EnergyDanceabilityPoint, PopularityValencePoint,
    PresentationData, SummaryReport, DEFAULT_TOP_ARTISTS, REPORT_FILE_NAME,
};
pub use stats::{mean, sample_std_dev, EnergyBand, EnergyBandCounts, HIGH_ENERGY_MIN, LOW_ENERGY_MAX};
